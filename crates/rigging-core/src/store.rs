//! Storage collaborator: the create-or-update contract the execution
//! controller writes through, with in-memory and file-backed stores.

use crate::dataobject::DataObject;
use crate::error::{Result, RiggingError};
use crate::execution::Execution;
use crate::io;
use crate::paths;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationResult::Created => "created",
            OperationResult::Updated => "updated",
            OperationResult::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

pub type Mutate<'m> = dyn FnMut(&mut DataObject) -> Result<()> + 'm;

pub trait Writer {
    /// Replace the stored status of an existing execution.
    fn update_execution_status(&self, exec: &Execution) -> Result<()>;

    /// Upsert by namespace/name. When the object exists it is loaded into
    /// `obj` before `mutate` runs. A `mutate` error aborts without writing.
    fn create_or_update_data_object(
        &self,
        obj: &mut DataObject,
        mutate: &mut Mutate<'_>,
    ) -> Result<OperationResult>;
}

pub trait Reader {
    fn get_execution(&self, namespace: &str, name: &str) -> Result<Option<Execution>>;
    fn get_data_object(&self, namespace: &str, name: &str) -> Result<Option<DataObject>>;
    fn list_data_objects(&self, namespace: &str) -> Result<Vec<DataObject>>;
}

fn new_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn prepare_new_execution(mut exec: Execution) -> Execution {
    if exec.metadata.uid.is_empty() {
        exec.metadata.uid = new_uid();
    }
    if exec.metadata.generation == 0 {
        exec.metadata.generation = 1;
    }
    exec
}

/// Shared upsert step; the caller persists `obj` unless `Unchanged`.
fn upsert(
    existing: Option<DataObject>,
    obj: &mut DataObject,
    mutate: &mut Mutate<'_>,
) -> Result<OperationResult> {
    match existing {
        None => {
            mutate(obj)?;
            if obj.metadata.uid.is_empty() {
                obj.metadata.uid = new_uid();
            }
            Ok(OperationResult::Created)
        }
        Some(current) => {
            *obj = current.clone();
            mutate(obj)?;
            if *obj == current {
                Ok(OperationResult::Unchanged)
            } else {
                Ok(OperationResult::Updated)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryStore {
    executions: Mutex<BTreeMap<String, Execution>>,
    data_objects: Mutex<BTreeMap<String, DataObject>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_execution(&self, exec: Execution) -> Result<Execution> {
        let mut executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
        let key = exec.metadata.key();
        if executions.contains_key(&key) {
            return Err(RiggingError::ExecutionExists(key));
        }
        let exec = prepare_new_execution(exec);
        executions.insert(key, exec.clone());
        Ok(exec)
    }
}

impl Writer for InMemoryStore {
    fn update_execution_status(&self, exec: &Execution) -> Result<()> {
        let mut executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
        let key = exec.metadata.key();
        let stored = executions
            .get_mut(&key)
            .ok_or(RiggingError::ExecutionNotFound(key))?;
        stored.status = exec.status.clone();
        Ok(())
    }

    fn create_or_update_data_object(
        &self,
        obj: &mut DataObject,
        mutate: &mut Mutate<'_>,
    ) -> Result<OperationResult> {
        let mut objects = self.data_objects.lock().unwrap_or_else(|e| e.into_inner());
        let key = obj.metadata.key();
        let result = upsert(objects.get(&key).cloned(), obj, mutate)?;
        if result != OperationResult::Unchanged {
            objects.insert(key, obj.clone());
        }
        Ok(result)
    }
}

impl Reader for InMemoryStore {
    fn get_execution(&self, namespace: &str, name: &str) -> Result<Option<Execution>> {
        let executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(executions.get(&format!("{namespace}/{name}")).cloned())
    }

    fn get_data_object(&self, namespace: &str, name: &str) -> Result<Option<DataObject>> {
        let objects = self.data_objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects.get(&format!("{namespace}/{name}")).cloned())
    }

    fn list_data_objects(&self, namespace: &str) -> Result<Vec<DataObject>> {
        let objects = self.data_objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects
            .values()
            .filter(|o| o.metadata.namespace == namespace)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One YAML file per object under `<root>/.rigging/`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn execution_path(&self, namespace: &str, name: &str) -> Result<PathBuf> {
        paths::validate_name(namespace)?;
        paths::validate_name(name)?;
        Ok(paths::execution_path(&self.root, namespace, name))
    }

    fn data_object_path(&self, namespace: &str, name: &str) -> Result<PathBuf> {
        paths::validate_name(namespace)?;
        paths::validate_name(name)?;
        Ok(paths::dataobject_path(&self.root, namespace, name))
    }

    pub fn create_execution(&self, exec: Execution) -> Result<Execution> {
        let path = self.execution_path(&exec.metadata.namespace, &exec.metadata.name)?;
        if path.exists() {
            return Err(RiggingError::ExecutionExists(exec.metadata.key()));
        }
        let exec = prepare_new_execution(exec);
        io::write_yaml(&path, &exec)?;
        Ok(exec)
    }

    /// Load an execution, failing when it does not exist.
    pub fn load_execution(&self, namespace: &str, name: &str) -> Result<Execution> {
        self.get_execution(namespace, name)?
            .ok_or_else(|| RiggingError::ExecutionNotFound(format!("{namespace}/{name}")))
    }
}

impl Writer for FileStore {
    fn update_execution_status(&self, exec: &Execution) -> Result<()> {
        let path = self.execution_path(&exec.metadata.namespace, &exec.metadata.name)?;
        let mut stored: Execution = io::read_yaml(&path)?
            .ok_or_else(|| RiggingError::ExecutionNotFound(exec.metadata.key()))?;
        stored.status = exec.status.clone();
        io::write_yaml(&path, &stored)
    }

    fn create_or_update_data_object(
        &self,
        obj: &mut DataObject,
        mutate: &mut Mutate<'_>,
    ) -> Result<OperationResult> {
        let path = self.data_object_path(&obj.metadata.namespace, &obj.metadata.name)?;
        let result = upsert(io::read_yaml(&path)?, obj, mutate)?;
        if result != OperationResult::Unchanged {
            io::write_yaml(&path, obj)?;
        }
        Ok(result)
    }
}

impl Reader for FileStore {
    fn get_execution(&self, namespace: &str, name: &str) -> Result<Option<Execution>> {
        io::read_yaml(&self.execution_path(namespace, name)?)
    }

    fn get_data_object(&self, namespace: &str, name: &str) -> Result<Option<DataObject>> {
        io::read_yaml(&self.data_object_path(namespace, name)?)
    }

    fn list_data_objects(&self, namespace: &str) -> Result<Vec<DataObject>> {
        paths::validate_name(namespace)?;
        let dir = paths::dataobject_dir(&self.root, namespace);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|x| x == "yaml"))
            .collect();
        files.sort();
        let mut objects = Vec::with_capacity(files.len());
        for path in files {
            if let Some(obj) = io::read_yaml(&path)? {
                objects.push(obj);
            }
        }
        Ok(objects)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
