//! FavoritesStore lifecycle and persistence tests

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use panorama_tour::{
        favorites::{
            FavoritesError, FavoritesStore, FileBackend, MemoryBackend, PersistenceBackend,
        },
        session::{SessionProvider, StaticSession},
    };
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    /// Loads fine, refuses every save while `full` is set.
    #[derive(Clone, Default)]
    struct FullDisk {
        inner: MemoryBackend,
        full: Arc<Mutex<bool>>,
    }

    impl PersistenceBackend for FullDisk {
        fn load(&mut self) -> io::Result<Option<String>> {
            self.inner.load()
        }

        fn save(&mut self, data: &str) -> io::Result<()> {
            if *self.full.lock() {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.inner.save(data)
        }
    }

    fn ready_store() -> (FavoritesStore<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::new();
        let mut store = FavoritesStore::new(backend.clone());
        store.init().unwrap();
        (store, backend)
    }

    // -----------------------------------------------------------------------
    // Session gating
    // -----------------------------------------------------------------------

    #[test]
    fn anonymous_users_cannot_save() {
        let (mut store, backend) = ready_store();
        let anon = StaticSession::anonymous();
        assert!(!anon.is_signed_in());
        assert!(matches!(
            store.add(&anon, "kyoto"),
            Err(FavoritesError::NotSignedIn)
        ));
        assert!(store.is_empty());
        assert!(backend.contents().is_none());
    }

    #[test]
    fn store_must_be_initialized() {
        let mut store = FavoritesStore::new(MemoryBackend::new());
        let user = StaticSession::signed_in("ana");
        assert!(matches!(
            store.add(&user, "kyoto"),
            Err(FavoritesError::NotInitialized)
        ));
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    #[test]
    fn add_remove_toggle() {
        let (mut store, _backend) = ready_store();
        let user = StaticSession::signed_in("ana");
        assert_eq!(user.display_name(), Some("ana"));

        assert!(store.add(&user, "kyoto").unwrap());
        assert!(!store.add(&user, "kyoto").unwrap());
        assert!(store.add(&user, "paris").unwrap());
        assert_eq!(store.len(), 2);

        assert!(store.remove(&user, "kyoto").unwrap());
        assert!(!store.remove(&user, "kyoto").unwrap());

        assert!(store.toggle(&user, "rome").unwrap());
        assert!(!store.toggle(&user, "rome").unwrap());
        let ids: Vec<&str> = store.list().iter().map(|f| f.destination_id.as_str()).collect();
        assert_eq!(ids, vec!["paris"]);
    }

    #[test]
    fn entries_keep_insertion_order_and_timestamps() {
        let (mut store, _backend) = ready_store();
        let user = StaticSession::signed_in("ana");
        let first = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        store.add_at(&user, "kyoto", first).unwrap();
        store.add_at(&user, "paris", second).unwrap();

        assert_eq!(store.list()[0].destination_id, "kyoto");
        assert_eq!(store.list()[0].added_at, first);
        assert_eq!(store.list()[1].added_at, second);
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    #[test]
    fn writes_through_and_reloads() {
        let (mut store, backend) = ready_store();
        let user = StaticSession::signed_in("ana");
        store.add(&user, "kyoto").unwrap();
        assert!(backend.contents().is_some_and(|s| s.contains("kyoto")));

        store.teardown().unwrap();
        assert!(!store.is_initialized());
        assert!(store.is_empty());

        let mut reopened = FavoritesStore::new(backend.clone());
        reopened.init().unwrap();
        assert!(reopened.contains("kyoto"));
    }

    #[test]
    fn failed_save_leaves_list_unchanged() {
        let user = StaticSession::signed_in("ana");
        let disk = FullDisk::default();
        let mut store = FavoritesStore::new(disk.clone());
        store.init().unwrap();
        store.add(&user, "paris").unwrap();

        *disk.full.lock() = true;
        assert!(matches!(store.add(&user, "kyoto"), Err(FavoritesError::Io(_))));
        assert!(!store.contains("kyoto"));
        assert_eq!(store.len(), 1);
        assert!(matches!(store.remove(&user, "paris"), Err(FavoritesError::Io(_))));
        assert!(store.contains("paris"));

        // A retry after the disk recovers really saves
        *disk.full.lock() = false;
        assert!(store.add(&user, "kyoto").unwrap());
        assert!(disk.inner.contents().is_some_and(|s| s.contains("kyoto")));
    }

    #[test]
    fn duplicates_in_storage_are_collapsed() {
        let backend = MemoryBackend::new();
        let mut seed = FavoritesStore::new(backend.clone());
        seed.init().unwrap();
        let user = StaticSession::signed_in("ana");
        seed.add(&user, "kyoto").unwrap();
        let raw = backend.contents().unwrap();
        // Simulate a corrupted double write: `[a]` + `[a]` -> `[a,a]`
        let doubled = format!("{},{}", raw.trim_end_matches(']'), raw.trim_start_matches('['));
        let mut writer = backend.clone();
        PersistenceBackend::save(&mut writer, &doubled).unwrap();

        let mut store = FavoritesStore::new(backend);
        store.init().unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn corrupt_data_is_a_format_error() {
        let mut backend = MemoryBackend::new();
        PersistenceBackend::save(&mut backend, "not json").unwrap();
        let mut store = FavoritesStore::new(backend);
        assert!(matches!(store.init(), Err(FavoritesError::Format(_))));
    }

    #[test]
    fn file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("favorites.json");
        let user = StaticSession::signed_in("ana");

        let mut store = FavoritesStore::new(FileBackend::new(&path));
        store.init().unwrap();
        assert!(store.is_empty());
        store.add(&user, "paris").unwrap();
        store.teardown().unwrap();
        assert!(path.exists());

        let mut reopened = FavoritesStore::new(FileBackend::new(&path));
        reopened.init().unwrap();
        assert!(reopened.contains("paris"));
    }
}
