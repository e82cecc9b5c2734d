//! Cuisine index views.

use std::collections::BTreeSet;

use restaurant_kv::NewRestaurant;

use crate::support::service;

#[tokio::test]
async fn index_is_symmetric() {
    let (_, service) = service().await;
    let mut created = Vec::new();
    for (name, cuisines) in [
        ("Pizza Palace", vec!["Italian", "Pizza"]),
        ("Trattoria", vec!["Italian"]),
        ("Sushi Go", vec!["Japanese", "Sushi"]),
        ("Plain Diner", vec![]),
    ] {
        created.push(
            service
                .create_restaurant(NewRestaurant::new(name, "NY", cuisines))
                .await
                .unwrap(),
        );
    }

    let expected: BTreeSet<String> = ["Italian", "Japanese", "Pizza", "Sushi"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(service.cuisines().await.unwrap(), expected);

    for restaurant in &created {
        for tag in service.cuisine_index().tags_of(&restaurant.id).await.unwrap() {
            assert!(service
                .restaurants_by_cuisine(&tag)
                .await
                .unwrap()
                .contains(&restaurant.id));
        }
    }
    for tag in service.cuisines().await.unwrap() {
        for id in service.restaurants_by_cuisine(&tag).await.unwrap() {
            assert!(service
                .cuisine_index()
                .tags_of(&id)
                .await
                .unwrap()
                .contains(&tag));
        }
    }

    let italian = service.restaurants_by_cuisine("Italian").await.unwrap();
    assert_eq!(italian.len(), 2);
    assert!(service
        .cuisine_index()
        .tags_of(&created[3].id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_tag_has_no_restaurants() {
    let (_, service) = service().await;
    assert!(service.restaurants_by_cuisine("Martian").await.unwrap().is_empty());
    assert!(service.cuisines().await.unwrap().is_empty());
}
