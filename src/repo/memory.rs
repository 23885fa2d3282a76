use indexmap::IndexMap;

use crate::model::item::{Person, WorkItem};

use super::{ItemPatch, ItemRepository, PersonDirectory, RegistryError, RepoError, TaskRegistry};

/// In-memory repository for tests and ephemeral projects. Stores the
/// flat item list in insertion order, the way a server would return it.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    items: IndexMap<String, WorkItem>,
    people: Vec<Person>,
    registered: Vec<String>,
    next_id: usize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        InMemoryRepository::default()
    }

    /// Seed with existing items (ids kept as given)
    pub fn with_items(items: Vec<WorkItem>) -> Self {
        let mut repo = InMemoryRepository::new();
        for item in items {
            repo.bump_next_id(&item.id);
            repo.items.insert(item.id.clone(), item);
        }
        repo
    }

    pub fn with_people(mut self, people: Vec<Person>) -> Self {
        self.people = people;
        self
    }

    pub fn registered_tasks(&self) -> &[String] {
        &self.registered
    }

    /// Re-seat `id` so it sits at sibling `position` among records
    /// sharing its parent; only relative sibling order matters to
    /// hydration.
    fn reposition(&mut self, id: &str, position: usize) {
        let Some(record) = self.items.shift_remove(id) else {
            return;
        };
        let mut seen = 0usize;
        let mut insert_at = self.items.len();
        for (i, other) in self.items.values().enumerate() {
            if other.parent == record.parent {
                if seen == position {
                    insert_at = i;
                    break;
                }
                seen += 1;
            }
        }
        self.items.shift_insert(insert_at, id.to_string(), record);
    }

    fn bump_next_id(&mut self, id: &str) {
        if let Some(n) = id.strip_prefix('w').and_then(|s| s.parse::<usize>().ok())
            && n >= self.next_id
        {
            self.next_id = n + 1;
        }
    }
}

impl ItemRepository for InMemoryRepository {
    fn load(&self, _project_id: &str) -> Result<Vec<WorkItem>, RepoError> {
        Ok(self.items.values().cloned().collect())
    }

    fn create(&mut self, item: &WorkItem) -> Result<String, RepoError> {
        let id = if item.id.is_empty() || self.items.contains_key(&item.id) {
            let id = format!("w{}", self.next_id.max(1));
            self.next_id = self.next_id.max(1) + 1;
            id
        } else {
            self.bump_next_id(&item.id);
            item.id.clone()
        };
        let mut stored = item.clone();
        stored.id = id.clone();
        self.items.insert(id.clone(), stored);
        Ok(id)
    }

    fn update(&mut self, id: &str, patch: &ItemPatch) -> Result<(), RepoError> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| RepoError::UnknownItem(id.to_string()))?;
        patch.apply(item);
        if let Some(position) = patch.position {
            self.reposition(id, position);
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), RepoError> {
        if !self.items.contains_key(id) {
            return Err(RepoError::UnknownItem(id.to_string()));
        }
        // Cascade through parent references
        let mut doomed = vec![id.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            let pid = doomed[i].clone();
            for item in self.items.values() {
                if item.parent.as_deref() == Some(&pid) {
                    doomed.push(item.id.clone());
                }
            }
            i += 1;
        }
        for d in &doomed {
            self.items.shift_remove(d);
        }
        self.registered.retain(|r| !doomed.contains(r));
        Ok(())
    }
}

impl PersonDirectory for InMemoryRepository {
    fn list(&self, _project_id: &str) -> Result<Vec<Person>, RepoError> {
        Ok(self.people.clone())
    }
}

impl TaskRegistry for InMemoryRepository {
    fn register_as_task(&mut self, item: &WorkItem) -> Result<(), RegistryError> {
        if item.level != crate::model::item::Level::Level4 {
            return Err(RegistryError::NotSchedulable(item.level.to_string()));
        }
        if !self.registered.contains(&item.id) {
            self.registered.push(item.id.clone());
        }
        Ok(())
    }
}
