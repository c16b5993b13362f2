use facesearch::config::DatabaseOptions;
use facesearch::db::{FaceMetadata, Population};
use facesearch::encoding::{DESCRIPTOR_DIM, euclidean_distance};
use facesearch::{FaceDB, FaceDbError, FaceDescriptor};
use rand::Rng;
use rstest::*;

fn descriptor(f: impl FnMut(usize) -> f64) -> FaceDescriptor {
    FaceDescriptor::try_from((0..DESCRIPTOR_DIM).map(f).collect::<Vec<_>>()).unwrap()
}

fn random_descriptor(rng: &mut impl Rng) -> FaceDescriptor {
    descriptor(|_| rng.random_range(-0.3..0.3))
}

/// 在第 0 维上平移 `offset`，与原向量的距离恰好为 `offset`
fn shifted(base: &FaceDescriptor, offset: f64) -> FaceDescriptor {
    let mut values = base.as_slice().to_vec();
    values[0] += offset;
    FaceDescriptor::try_from(values).unwrap()
}

#[fixture]
fn population() -> Population {
    Population::default()
}

#[fixture]
async fn db() -> FaceDB {
    FaceDB::open(&DatabaseOptions::default()).await.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_register_and_exact_match(#[future] db: FaceDB, population: Population) {
    let db = db.await;
    let v = descriptor(|i| i as f64 / 1000.);

    let id = db.register(&population, "alice.jpg", &v).await.unwrap();
    let info = db.face_info(&population, id).await.unwrap().unwrap();
    assert_eq!(info.person_name.as_deref(), Some("alice"));

    let result = db.search(&population, &v, 1, 0.0).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, id);
    assert_eq!(result[0].person_name, "alice");
}

#[rstest]
#[tokio::test]
async fn test_out_of_threshold(#[future] db: FaceDB, population: Population) {
    let db = db.await;
    let v = descriptor(|i| (i as f64).sin());
    db.register(&population, "bob", &v).await.unwrap();

    let unknown = shifted(&v, 10.);
    assert!((euclidean_distance(v.as_slice(), unknown.as_slice()) - 10.).abs() < 1e-9);

    let result = db.search(&population, &unknown, 5, 5.).await.unwrap();
    assert!(result.is_empty());

    let result = db.search(&population, &unknown, 5, 10.5).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].person_name, "bob");
}

#[rstest]
#[tokio::test]
async fn test_empty_population(#[future] db: FaceDB, population: Population) {
    let db = db.await;
    let result = db.search(&population, &descriptor(|_| 0.), 10, 100.).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(db.count_faces(&population).await.unwrap(), 0);
}

#[rstest]
#[case(0)]
#[case(-1)]
#[tokio::test]
async fn test_non_positive_k(#[future] db: FaceDB, population: Population, #[case] k: i64) {
    let db = db.await;
    let v = descriptor(|_| 0.1);
    db.register(&population, "carol.png", &v).await.unwrap();
    assert!(db.search(&population, &v, k, 1.).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_ranked_and_limited(#[future] db: FaceDB, population: Population) {
    let db = db.await;
    let base = descriptor(|i| (i % 7) as f64 * 0.05);

    // 插入顺序与距离顺序不同
    for (name, offset) in [("d3.jpg", 0.3), ("d1.jpg", 0.1), ("d5.jpg", 0.5), ("d2.jpg", 0.2), ("d4.jpg", 0.4)] {
        db.register(&population, name, &shifted(&base, offset)).await.unwrap();
    }

    let result = db.search(&population, &base, 3, 1.).await.unwrap();
    let names = result.iter().map(|m| m.person_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["d1", "d2", "d3"]);

    let result = db.search(&population, &base, 10, 0.35).await.unwrap();
    let names = result.iter().map(|m| m.person_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["d1", "d2", "d3"]);
}

#[rstest]
#[tokio::test]
async fn test_random_search_properties(#[future] db: FaceDB, population: Population) {
    let db = db.await;
    let mut rng = rand::rng();

    let mut stored = vec![];
    for i in 0..50 {
        let v = random_descriptor(&mut rng);
        let name = format!("person_{i}.jpg");
        db.register(&population, &name, &v).await.unwrap();
        stored.push((format!("person_{i}"), v));
    }

    for _ in 0..10 {
        let unknown = random_descriptor(&mut rng);
        let k = rng.random_range(1..20);
        let confidence = rng.random_range(2.4..3.2);
        let result = db.search(&population, &unknown, k, confidence).await.unwrap();
        assert!(result.len() <= k as usize);

        let distances = result
            .iter()
            .map(|m| {
                let (_, v) = stored.iter().find(|(name, _)| *name == m.person_name).unwrap();
                euclidean_distance(v.as_slice(), unknown.as_slice())
            })
            .collect::<Vec<_>>();
        for d in &distances {
            assert!(*d <= confidence + 1e-9);
        }
        for w in distances.windows(2) {
            assert!(w[0] <= w[1] + 1e-12);
        }

        // 返回数量不足 k 时，说明阈值内的记录已全部返回
        let eligible = stored
            .iter()
            .filter(|(_, v)| euclidean_distance(v.as_slice(), unknown.as_slice()) <= confidence - 1e-9)
            .count();
        assert!(result.len() >= eligible.min(k as usize));
    }
}

#[rstest]
#[tokio::test]
async fn test_bulk_registration(#[future] db: FaceDB, population: Population) {
    let db = db.await;
    let images = vec![
        ("1.jpg".to_owned(), vec![descriptor(|_| 0.1)]),
        ("2.jpg".to_owned(), vec![]),
        ("3.jpg".to_owned(), vec![descriptor(|_| 0.3), descriptor(|_| 0.9)]),
    ];
    let faces = facesearch::bulk::select_registrations(images);
    let ids = db.register_batch(&population, &faces).await.unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(db.count_faces(&population).await.unwrap(), 2);

    let names = [
        db.face_info(&population, ids[0]).await.unwrap().unwrap().person_name,
        db.face_info(&population, ids[1]).await.unwrap().unwrap().person_name,
    ];
    assert_eq!(names, [Some("1".to_owned()), Some("3".to_owned())]);
}

#[rstest]
#[tokio::test]
async fn test_unknown_population(#[future] db: FaceDB) {
    let db = db.await;
    let other: Population = "other".parse().unwrap();
    let v = descriptor(|_| 0.);

    let err = db.search(&other, &v, 1, 1.).await.unwrap_err();
    assert!(matches!(err, FaceDbError::SearchFailed(_)));

    let err = db.register(&other, "x.jpg", &v).await.unwrap_err();
    assert!(matches!(err, FaceDbError::InsertFailed(_)));

    db.create_population(&other).await.unwrap();
    db.register(&other, "x.jpg", &v).await.unwrap();
    assert_eq!(db.search(&other, &v, 1, 0.).await.unwrap().len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_metadata(#[future] db: FaceDB, population: Population) {
    let db = db.await;
    let id = db.register(&population, "Jennifer_Lopez_0001.jpg", &descriptor(|_| 0.2)).await.unwrap();

    let info = db.face_info(&population, id).await.unwrap().unwrap();
    assert_eq!(info.version_number, None);
    assert_eq!(info.date, None);
    assert_eq!(info.location, None);

    let metadata = FaceMetadata {
        version_number: "2.5".to_owned(),
        date: "23-09-2019".to_owned(),
        location: "New York".to_owned(),
    };
    assert!(db.update_metadata(&population, id, &metadata).await.unwrap());
    assert!(!db.update_metadata(&population, id + 100, &metadata).await.unwrap());

    let info = db.face_info(&population, id).await.unwrap().unwrap();
    assert_eq!(info.person_name.as_deref(), Some("Jennifer_Lopez_0001"));
    assert_eq!(info.version_number.as_deref(), Some("2.5"));
    assert_eq!(info.date.as_deref(), Some("23-09-2019"));
    assert_eq!(info.location.as_deref(), Some("New York"));

    assert!(db.face_info(&population, id + 100).await.unwrap().is_none());
}
