use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::config::ProjectConfig;
use crate::model::item::{Person, WorkItem};

use super::{ItemPatch, ItemRepository, PersonDirectory, RegistryError, RepoError, TaskRegistry};

pub const CONFIG_FILE: &str = "beam.toml";
pub const DATA_FILE: &str = "beam.json";

/// On-disk project data (beam.json): the flat item list, the person
/// directory, and the registered-task log. Item order within a parent
/// is sibling order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub items: Vec<WorkItem>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// One registered schedulable work unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub item_id: String,
    pub name: String,
    pub registered: NaiveDate,
}

/// File-backed repository. Every successful mutation is written back to
/// beam.json immediately (temp file + rename, so a crash never leaves a
/// torn file).
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    file: ProjectFile,
}

impl JsonFileRepository {
    /// Open an existing beam.json
    pub fn open(root: &Path) -> Result<Self, RepoError> {
        let path = root.join(DATA_FILE);
        let content = fs::read_to_string(&path)?;
        let file: ProjectFile =
            serde_json::from_str(&content).map_err(|e| RepoError::Malformed(e.to_string()))?;
        Ok(JsonFileRepository { path, file })
    }

    /// Create a fresh beam.json (fails if one already exists)
    pub fn init(root: &Path, file: ProjectFile) -> Result<Self, RepoError> {
        let path = root.join(DATA_FILE);
        if path.exists() {
            return Err(RepoError::Rejected(format!(
                "{} already exists",
                path.display()
            )));
        }
        let repo = JsonFileRepository { path, file };
        repo.save()?;
        Ok(repo)
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.file.tasks
    }

    fn save(&self) -> Result<(), RepoError> {
        let content = serde_json::to_string_pretty(&self.file)
            .map_err(|e| RepoError::Malformed(e.to_string()))?;
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.file.items.iter().position(|i| i.id == id)
    }

    fn next_id(&self) -> String {
        let mut max = 0usize;
        for item in &self.file.items {
            if let Some(n) = item.id.strip_prefix('w').and_then(|s| s.parse::<usize>().ok())
                && n > max
            {
                max = n;
            }
        }
        format!("w{}", max + 1)
    }

    /// Re-seat `idx` so the record sits at sibling `position` among the
    /// records sharing its parent. Only relative sibling order matters
    /// to hydration, so records of other parents stay where they are.
    fn reposition(&mut self, idx: usize, position: usize) {
        let record = self.file.items.remove(idx);
        let mut seen = 0usize;
        let mut insert_at = self.file.items.len();
        for (i, other) in self.file.items.iter().enumerate() {
            if other.parent == record.parent {
                if seen == position {
                    insert_at = i;
                    break;
                }
                seen += 1;
            }
        }
        self.file.items.insert(insert_at, record);
    }
}

impl ItemRepository for JsonFileRepository {
    fn load(&self, _project_id: &str) -> Result<Vec<WorkItem>, RepoError> {
        Ok(self.file.items.clone())
    }

    fn create(&mut self, item: &WorkItem) -> Result<String, RepoError> {
        let id = if self.index_of(&item.id).is_some() || item.id.is_empty() {
            self.next_id()
        } else {
            item.id.clone()
        };
        let mut stored = item.clone();
        stored.id = id.clone();
        stored.children.clear();
        self.file.items.push(stored);
        self.save()?;
        Ok(id)
    }

    fn update(&mut self, id: &str, patch: &ItemPatch) -> Result<(), RepoError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| RepoError::UnknownItem(id.to_string()))?;
        patch.apply(&mut self.file.items[idx]);
        if let Some(position) = patch.position {
            self.reposition(idx, position);
        }
        self.save()
    }

    fn delete(&mut self, id: &str) -> Result<(), RepoError> {
        if self.index_of(id).is_none() {
            return Err(RepoError::UnknownItem(id.to_string()));
        }
        // Cascade through parent references
        let mut doomed = vec![id.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            let pid = doomed[i].clone();
            for item in &self.file.items {
                if item.parent.as_deref() == Some(&pid) {
                    doomed.push(item.id.clone());
                }
            }
            i += 1;
        }
        self.file.items.retain(|it| !doomed.contains(&it.id));
        self.file.tasks.retain(|t| !doomed.contains(&t.item_id));
        self.save()
    }
}

impl PersonDirectory for JsonFileRepository {
    fn list(&self, _project_id: &str) -> Result<Vec<Person>, RepoError> {
        Ok(self.file.people.clone())
    }
}

impl TaskRegistry for JsonFileRepository {
    fn register_as_task(&mut self, item: &WorkItem) -> Result<(), RegistryError> {
        if item.level != crate::model::item::Level::Level4 {
            return Err(RegistryError::NotSchedulable(item.level.to_string()));
        }
        if self.file.tasks.iter().any(|t| t.item_id == item.id) {
            return Ok(());
        }
        self.file.tasks.push(TaskRecord {
            item_id: item.id.clone(),
            name: item.name.clone(),
            registered: chrono::Local::now().date_naive(),
        });
        self.save().map_err(|e| RegistryError::Failed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Project discovery + config
// ---------------------------------------------------------------------------

/// Walk up from `start` looking for a directory containing beam.toml
pub fn discover_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join(CONFIG_FILE).is_file() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

/// Read and parse beam.toml from a project root
pub fn load_config(root: &Path) -> Result<ProjectConfig, RepoError> {
    let content = fs::read_to_string(root.join(CONFIG_FILE))?;
    toml::from_str(&content).map_err(|e| RepoError::Malformed(e.to_string()))
}

/// Write beam.toml to a project root
pub fn save_config(root: &Path, config: &ProjectConfig) -> Result<(), RepoError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| RepoError::Malformed(e.to_string()))?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}
