//! Rating-ranked listing.

use restaurant_kv::{ErrorKind, Key, KvStore, NewReview, Page};

use crate::support::{restaurant, service};

fn names(restaurants: &[restaurant_kv::Restaurant]) -> Vec<&str> {
    restaurants.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn higher_average_ranks_first() {
    let (_, service) = service().await;
    let a = restaurant(&service, "Alpha", "1").await;
    let b = restaurant(&service, "Bravo", "2").await;
    let c = restaurant(&service, "Charlie", "3").await;

    for (id, rating) in [(&a.id, 3), (&b.id, 5), (&c.id, 4), (&c.id, 5)] {
        service
            .add_review(id, NewReview::new(rating, ""))
            .await
            .unwrap();
    }

    let top = service.top_restaurants(Page::new(1, 10)).await.unwrap();
    assert_eq!(names(&top), vec!["Bravo", "Charlie", "Alpha"]);
    assert_eq!(top[1].average_rating, 4.5);

    for pair in top.windows(2) {
        assert!(pair[0].average_rating >= pair[1].average_rating);
    }
}

#[tokio::test]
async fn ties_keep_creation_order() {
    let (_, service) = service().await;
    let a = restaurant(&service, "Alpha", "1").await;
    restaurant(&service, "Bravo", "2").await;
    let c = restaurant(&service, "Charlie", "3").await;

    let unrated = service.top_restaurants(Page::default()).await.unwrap();
    assert_eq!(names(&unrated), vec!["Alpha", "Bravo", "Charlie"]);

    // re-scoring keeps a member's original position among equals
    service.add_review(&c.id, NewReview::new(3, "")).await.unwrap();
    service.add_review(&a.id, NewReview::new(3, "")).await.unwrap();
    let top = service.top_restaurants(Page::default()).await.unwrap();
    assert_eq!(names(&top), vec!["Alpha", "Charlie", "Bravo"]);
}

#[tokio::test]
async fn pages_through_the_ranking() {
    let (_, service) = service().await;
    for (i, rating) in [1u8, 2, 3, 4, 5].into_iter().enumerate() {
        let created = restaurant(&service, &format!("R{rating}"), &i.to_string()).await;
        service
            .add_review(&created.id, NewReview::new(rating, ""))
            .await
            .unwrap();
    }

    let first = service.top_restaurants(Page::new(1, 2)).await.unwrap();
    let second = service.top_restaurants(Page::new(2, 2)).await.unwrap();
    let third = service.top_restaurants(Page::new(3, 2)).await.unwrap();
    let fourth = service.top_restaurants(Page::new(4, 2)).await.unwrap();

    assert_eq!(names(&first), vec!["R5", "R4"]);
    assert_eq!(names(&second), vec!["R3", "R2"]);
    assert_eq!(names(&third), vec!["R1"]);
    assert!(fourth.is_empty());

    let err = service.top_restaurants(Page::new(0, 2)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn ranked_ids_without_records_are_skipped() {
    let (store, service) = service().await;
    let real = restaurant(&service, "Real", "1").await;
    store
        .zadd(&service.keys().key(Key::RatingRanking), "ghost", 5.0)
        .await
        .unwrap();

    let top = service.top_restaurants(Page::default()).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, real.id);
}
