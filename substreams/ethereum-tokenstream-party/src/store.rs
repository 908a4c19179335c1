//! Entity storage. Records are loaded and saved whole; there is no partial update.

use std::collections::{BTreeMap, HashMap};

use crate::{
    error::StoreResult,
    schema::{Entity, EntityKind, StoredEntity},
};

pub trait EntityStore {
    fn load(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Entity>>;

    /// Persists `entity` at its key, overwriting any previous record.
    fn save(&mut self, entity: Entity) -> StoreResult<()>;

    /// Persists a whole block of writes.
    ///
    /// The default saves one entity at a time, so a failure midway leaves the earlier writes in
    /// place. Stores that can fail part way through override this to apply all or nothing.
    fn save_all(&mut self, entities: Vec<Entity>) -> StoreResult<()> {
        for entity in entities {
            self.save(entity)?;
        }
        Ok(())
    }

    fn load_typed<T: StoredEntity>(&self, id: &str) -> StoreResult<Option<T>>
    where
        Self: Sized,
    {
        self.load(T::KIND, id)?
            .map(T::from_entity)
            .transpose()
    }

    fn save_typed<T: StoredEntity>(&mut self, entity: T) -> StoreResult<()>
    where
        Self: Sized,
    {
        self.save(entity.into_entity())
    }
}

/// Read side used by queries and by source recovery.
pub trait EntityScan {
    /// All entities of `kind`, ordered by id.
    fn scan(&self, kind: EntityKind) -> StoreResult<Vec<Entity>>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entities: BTreeMap<(EntityKind, String), Entity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl EntityStore for MemoryStore {
    fn load(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Entity>> {
        Ok(self
            .entities
            .get(&(kind, id.to_string()))
            .cloned())
    }

    fn save(&mut self, entity: Entity) -> StoreResult<()> {
        self.entities
            .insert((entity.kind(), entity.id().to_string()), entity);
        Ok(())
    }

    fn save_all(&mut self, entities: Vec<Entity>) -> StoreResult<()> {
        self.entities.extend(
            entities
                .into_iter()
                .map(|entity| ((entity.kind(), entity.id().to_string()), entity)),
        );
        Ok(())
    }
}

impl EntityScan for MemoryStore {
    fn scan(&self, kind: EntityKind) -> StoreResult<Vec<Entity>> {
        Ok(self
            .entities
            .range((kind, String::new())..)
            .take_while(|((k, _), _)| *k == kind)
            .map(|(_, entity)| entity.clone())
            .collect())
    }
}

/// Block-scoped overlay over a store.
///
/// Writes are staged until [`BlockBatch::commit`]; loads see staged writes first. Dropping the
/// batch without committing discards everything written during the block.
pub struct BlockBatch<'a, S: EntityStore> {
    inner: &'a mut S,
    staged: HashMap<(EntityKind, String), usize>,
    writes: Vec<Entity>,
}

impl<'a, S: EntityStore> BlockBatch<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self { inner, staged: HashMap::new(), writes: Vec::new() }
    }

    pub fn pending(&self) -> &[Entity] {
        &self.writes
    }

    /// Flushes staged writes to the underlying store with one [`EntityStore::save_all`] and
    /// returns them in write order.
    pub fn commit(self) -> StoreResult<Vec<Entity>> {
        let Self { inner, writes, .. } = self;
        inner.save_all(writes.clone())?;
        Ok(writes)
    }
}

impl<S: EntityStore> EntityStore for BlockBatch<'_, S> {
    fn load(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Entity>> {
        match self.staged.get(&(kind, id.to_string())) {
            Some(idx) => Ok(Some(self.writes[*idx].clone())),
            None => self.inner.load(kind, id),
        }
    }

    fn save(&mut self, entity: Entity) -> StoreResult<()> {
        let key = (entity.kind(), entity.id().to_string());
        match self.staged.get(&key) {
            Some(idx) => self.writes[*idx] = entity,
            None => {
                self.staged.insert(key, self.writes.len());
                self.writes.push(entity);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Organization, Stream};

    fn org(id: &str, name: &str) -> Organization {
        Organization { id: id.to_string(), created_at: 10, owner: vec![1u8; 20], name: name.to_string() }
    }

    #[test]
    fn test_save_overwrites_whole_record() {
        let mut store = MemoryStore::new();
        store.save_typed(org("0x01", "Acme")).unwrap();
        store.save_typed(org("0x01", "Globex")).unwrap();

        let loaded: Organization = store.load_typed("0x01").unwrap().unwrap();
        assert_eq!(loaded.name, "Globex");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_is_scoped_by_kind() {
        let mut store = MemoryStore::new();
        store.save_typed(org("0x01", "Acme")).unwrap();

        assert!(store
            .load(EntityKind::Stream, "0x01")
            .unwrap()
            .is_none());
        assert!(store.load_typed::<Stream>("0x01").unwrap().is_none());
    }

    #[test]
    fn test_scan_returns_only_requested_kind() {
        let mut store = MemoryStore::new();
        store.save_typed(org("0x02", "B")).unwrap();
        store.save_typed(org("0x01", "A")).unwrap();
        store
            .save_typed(Stream {
                id: "0x03".to_string(),
                organization: "0x01".to_string(),
                user: None,
                creator: None,
                contract: None,
                name: Some("payroll".to_string()),
                created_at: 11,
            })
            .unwrap();

        let orgs = store.scan(EntityKind::Organization).unwrap();
        let ids: Vec<_> = orgs.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["0x01", "0x02"]);
        assert_eq!(store.scan(EntityKind::Stream).unwrap().len(), 1);
        assert!(store
            .scan(EntityKind::StreamActivity)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_batch_reads_its_own_writes() {
        let mut store = MemoryStore::new();
        store.save_typed(org("0x01", "Acme")).unwrap();

        let mut batch = BlockBatch::new(&mut store);
        assert!(batch.load_typed::<Organization>("0x01").unwrap().is_some());

        batch.save_typed(org("0x02", "Globex")).unwrap();
        batch.save_typed(org("0x02", "Initech")).unwrap();
        let staged: Organization = batch.load_typed("0x02").unwrap().unwrap();
        assert_eq!(staged.name, "Initech");
        assert_eq!(batch.pending().len(), 1);

        let written = batch.commit().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(store.count(EntityKind::Organization), 2);
    }

    /// Only accepts whole blocks.
    #[derive(Default)]
    struct BlockOnlyStore {
        blocks: Vec<Vec<Entity>>,
    }

    impl EntityStore for BlockOnlyStore {
        fn load(&self, _kind: EntityKind, _id: &str) -> StoreResult<Option<Entity>> {
            Ok(None)
        }

        fn save(&mut self, entity: Entity) -> StoreResult<()> {
            Err(crate::error::StoreError::Unavailable(format!("single save of {}", entity.id())))
        }

        fn save_all(&mut self, entities: Vec<Entity>) -> StoreResult<()> {
            self.blocks.push(entities);
            Ok(())
        }
    }

    #[test]
    fn test_commit_writes_the_block_at_once() {
        let mut store = BlockOnlyStore::default();
        let mut batch = BlockBatch::new(&mut store);
        batch.save_typed(org("0x01", "Acme")).unwrap();
        batch.save_typed(org("0x02", "Globex")).unwrap();

        assert_eq!(batch.commit().unwrap().len(), 2);
        assert_eq!(store.blocks.len(), 1);
        assert_eq!(store.blocks[0].len(), 2);
    }

    #[test]
    fn test_dropped_batch_discards_writes() {
        let mut store = MemoryStore::new();
        {
            let mut batch = BlockBatch::new(&mut store);
            batch.save_typed(org("0x01", "Acme")).unwrap();
        }
        assert!(store.is_empty());
    }
}
