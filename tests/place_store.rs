//! On-disk behaviour of the place store: persistence across reopen and the
//! schema version lifecycle.

use favorite_places::{NewPlace, PlaceStore, StoreError, SCHEMA_VERSION};
use tempfile::TempDir;

fn names(store: &PlaceStore) -> Vec<String> {
    store
        .get_all()
        .unwrap()
        .into_iter()
        .map(|place| place.name)
        .collect()
}

#[test]
fn places_survive_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("FavoritePlaces.db");

    let cafe_id = {
        let store = PlaceStore::open(&path)?;
        store.add(&NewPlace::new("Park", 43.66, -79.39))?;
        store.add(&NewPlace::new("Cafe", 43.65, -79.38))?
    };

    let store = PlaceStore::open(&path)?;
    assert_eq!(store.path(), Some(path.as_path()));
    assert_eq!(store.schema_version()?, SCHEMA_VERSION);
    assert_eq!(names(&store), ["Cafe", "Park"]);

    let cafe = store.get_by_id(cafe_id)?.expect("cafe should exist");
    assert_eq!(cafe.latitude, 43.65);
    assert_eq!(cafe.longitude, -79.38);
    Ok(())
}

#[test]
fn missing_parent_directories_are_created() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("deeper").join("places.db");

    let store = PlaceStore::open(&path)?;
    store.add(&NewPlace::new("Somewhere", 0.0, 0.0))?;

    assert!(path.exists());
    Ok(())
}

#[test]
fn version_bump_discards_saved_places() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("places.db");

    {
        let store = PlaceStore::open_with_version(&path, 1)?;
        for name in ["A", "B", "C"] {
            store.add(&NewPlace::new(name, 1.0, 2.0))?;
        }
        assert_eq!(store.count()?, 3);
    }

    let store = PlaceStore::open_with_version(&path, 2)?;
    assert_eq!(store.schema_version()?, 2);
    assert_eq!(store.count()?, 0);
    assert!(store.get_all()?.is_empty());

    let id = store.add(&NewPlace::new("Fresh", 3.0, 4.0))?;
    assert_eq!(store.get_by_id(id)?.map(|p| p.name), Some("Fresh".to_string()));
    assert_eq!(store.count()?, 1);
    Ok(())
}

#[test]
fn reopening_at_same_version_keeps_rows() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("places.db");

    PlaceStore::open_with_version(&path, 2)?.add(&NewPlace::new("Kept", 0.0, 0.0))?;

    let store = PlaceStore::open_with_version(&path, 2)?;
    assert_eq!(names(&store), ["Kept"]);
    Ok(())
}

#[test]
fn older_binary_refuses_newer_database() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("places.db");

    PlaceStore::open_with_version(&path, SCHEMA_VERSION + 1)?;

    match PlaceStore::open(&path) {
        Err(StoreError::SchemaDowngrade { found, supported }) => {
            assert_eq!(found, SCHEMA_VERSION + 1);
            assert_eq!(supported, SCHEMA_VERSION);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("downgrade should be refused"),
    }
    Ok(())
}

#[test]
fn ids_keep_increasing_after_delete_all() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = PlaceStore::open(dir.path().join("places.db"))?;

    let first = store.add(&NewPlace::new("A", 0.0, 0.0))?;
    let second = store.add(&NewPlace::new("B", 0.0, 0.0))?;
    assert_eq!(store.delete_all()?, 2);

    let third = store.add(&NewPlace::new("C", 0.0, 0.0))?;
    assert!(third > second && second > first);
    assert_eq!(store.count()?, 1);
    Ok(())
}
