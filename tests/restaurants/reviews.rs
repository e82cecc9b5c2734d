//! Review submission, listing and deletion.

use restaurant_kv::{Error, ErrorKind, Key, KvStore, NewReview, Page};

use crate::support::{pizza_palace, restaurant, service};

#[tokio::test]
async fn five_then_three_averages_four() {
    let (_, service) = service().await;
    let created = restaurant(&service, "Grill House", "LA").await;

    let first = service
        .add_review(&created.id, NewReview::new(5, "superb"))
        .await
        .unwrap();
    assert_eq!(first.rating.average_rating, 5.0);
    assert_eq!(first.rating.review_count, 1);

    let second = service
        .add_review(&created.id, NewReview::new(3, "fine"))
        .await
        .unwrap();
    assert_eq!(second.rating.rating_sum, 8);
    assert_eq!(second.rating.review_count, 2);
    assert_eq!(second.rating.average_rating, 4.0);

    let stored = service.records().get(&created.id).await.unwrap();
    assert_eq!(stored.average_rating, 4.0);
    assert_eq!(stored.rating_sum, 8);
    assert_eq!(service.ratings().score(&created.id).await.unwrap(), Some(4.0));
}

#[tokio::test]
async fn average_is_rounded_mean_of_all_ratings() {
    let (_, service) = service().await;
    let created = pizza_palace(&service).await;

    let ratings = [5u8, 4, 4, 2, 1, 5, 3];
    for rating in ratings {
        service
            .add_review(&created.id, NewReview::new(rating, ""))
            .await
            .unwrap();
    }

    let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
    let expected = (f64::from(sum) / ratings.len() as f64 * 10.0).round() / 10.0;
    let stored = service.records().get(&created.id).await.unwrap();
    assert_eq!(stored.average_rating, expected);
    assert_eq!(stored.average_rating, 3.4);
    assert_eq!(service.reviews().count(&created.id).await.unwrap(), 7);
}

#[tokio::test]
async fn out_of_range_rating_writes_nothing() {
    let (store, service) = service().await;
    let created = pizza_palace(&service).await;
    let keys_before = store.keys().unwrap();

    for rating in [0u8, 6, 200] {
        let err = service
            .add_review(&created.id, NewReview::new(rating, "?"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(store.keys().unwrap(), keys_before);
    assert_eq!(service.records().get(&created.id).await.unwrap().rating_sum, 0);
}

#[tokio::test]
async fn list_is_most_recent_first() {
    let (_, service) = service().await;
    let created = pizza_palace(&service).await;

    let mut ids = Vec::new();
    for (rating, body) in [(5, "first"), (4, "second"), (3, "third")] {
        let change = service
            .add_review(&created.id, NewReview::new(rating, body))
            .await
            .unwrap();
        ids.push(change.review.id);
    }

    let all = service.list_reviews(&created.id, Page::new(1, 10)).await.unwrap();
    let bodies: Vec<&str> = all.iter().map(|r| r.body.as_str()).collect();
    assert_eq!(bodies, vec!["third", "second", "first"]);
    assert!(all.iter().all(|r| r.restaurant_id == created.id));

    let page_two = service.list_reviews(&created.id, Page::new(2, 2)).await.unwrap();
    assert_eq!(page_two.len(), 1);
    assert_eq!(page_two[0].id, ids[0]);

    assert!(service
        .list_reviews(&created.id, Page::new(3, 2))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn list_rejects_bad_pages() {
    let (_, service) = service().await;
    let created = pizza_palace(&service).await;

    for page in [Page::new(0, 10), Page::new(1, 0), Page::new(1, 101)] {
        let err = service.list_reviews(&created.id, page).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[tokio::test]
async fn dangling_review_ids_are_skipped() {
    let (store, service) = service().await;
    let created = pizza_palace(&service).await;
    let kept = service
        .add_review(&created.id, NewReview::new(4, "kept"))
        .await
        .unwrap();
    let lost = service
        .add_review(&created.id, NewReview::new(2, "lost"))
        .await
        .unwrap();

    store
        .delete(&service.keys().key(Key::Review(&lost.review.id)))
        .await
        .unwrap();

    let listed = service.list_reviews(&created.id, Page::default()).await.unwrap();
    assert_eq!(listed, vec![kept.review]);
}

#[tokio::test]
async fn deleting_a_review_rebalances_the_aggregate() {
    let (store, service) = service().await;
    let created = pizza_palace(&service).await;

    let five = service
        .add_review(&created.id, NewReview::new(5, "great"))
        .await
        .unwrap();
    service
        .add_review(&created.id, NewReview::new(3, "ok"))
        .await
        .unwrap();

    let change = service
        .remove_review(&created.id, &five.review.id)
        .await
        .unwrap();
    assert_eq!(change.review, five.review);
    assert_eq!(change.rating.rating_sum, 3);
    assert_eq!(change.rating.review_count, 1);
    assert_eq!(change.rating.average_rating, 3.0);

    let stored = service.records().get(&created.id).await.unwrap();
    assert_eq!(stored.rating_sum, 3);
    assert_eq!(stored.average_rating, 3.0);
    assert_eq!(service.ratings().score(&created.id).await.unwrap(), Some(3.0));
    assert!(service.reviews().get(&five.review.id).await.unwrap().is_none());
    assert!(!store
        .keys()
        .unwrap()
        .contains(&service.keys().key(Key::Review(&five.review.id))));

    // a later submission averages over the surviving reviews only
    let after = service
        .add_review(&created.id, NewReview::new(4, "better"))
        .await
        .unwrap();
    assert_eq!(after.rating.average_rating, 3.5);
}

#[tokio::test]
async fn deleting_the_last_review_resets_to_zero() {
    let (_, service) = service().await;
    let created = pizza_palace(&service).await;
    let only = service
        .add_review(&created.id, NewReview::new(4, "solo"))
        .await
        .unwrap();

    let change = service
        .remove_review(&created.id, &only.review.id)
        .await
        .unwrap();
    assert_eq!(change.rating.review_count, 0);
    assert_eq!(change.rating.average_rating, 0.0);
    assert_eq!(service.ratings().score(&created.id).await.unwrap(), Some(0.0));
    assert!(service
        .list_reviews(&created.id, Page::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn deleting_twice_subtracts_once() {
    let (_, service) = service().await;
    let created = pizza_palace(&service).await;
    let review = service
        .add_review(&created.id, NewReview::new(5, "once"))
        .await
        .unwrap();
    service
        .add_review(&created.id, NewReview::new(1, "stays"))
        .await
        .unwrap();

    service
        .remove_review(&created.id, &review.review.id)
        .await
        .unwrap();
    let err = service
        .remove_review(&created.id, &review.review.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "review", .. }));

    let stored = service.records().get(&created.id).await.unwrap();
    assert_eq!(stored.rating_sum, 1);
    assert_eq!(stored.average_rating, 1.0);
}

#[tokio::test]
async fn cross_restaurant_delete_is_an_integrity_mismatch() {
    let (store, service) = service().await;
    let owner = pizza_palace(&service).await;
    let other = restaurant(&service, "Taco Town", "SF").await;
    let review = service
        .add_review(&owner.id, NewReview::new(5, "mine"))
        .await
        .unwrap();
    let keys_before = store.keys().unwrap();
    let owner_before = service.records().get(&owner.id).await.unwrap();

    let err = service
        .remove_review(&other.id, &review.review.id)
        .await
        .unwrap_err();
    match &err {
        Error::IntegrityMismatch {
            review_id,
            expected,
            actual,
        } => {
            assert_eq!(review_id, &review.review.id);
            assert_eq!(expected, &other.id);
            assert_eq!(actual, &owner.id);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);
    assert_eq!(err.status_code(), 409);

    assert_eq!(store.keys().unwrap(), keys_before);
    assert_eq!(service.records().get(&owner.id).await.unwrap(), owner_before);
    assert_eq!(
        service.reviews().get(&review.review.id).await.unwrap(),
        Some(review.review.clone())
    );
    assert_eq!(service.reviews().count(&owner.id).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_review_is_not_found() {
    let (_, service) = service().await;
    let created = pizza_palace(&service).await;
    let err = service.remove_review(&created.id, "missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
