// src/flow/positions.rs
//! The shared position table (P): the single source of truth for source
//! locations in the final report. Built while lowering and read-only
//! afterwards; other analyses translate their spans through it.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// A resolved source position. Column is intentionally excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub filename: PathBuf,
    pub line: u32,
}

/// Interned position handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PosId(u32);

#[derive(Debug, Default)]
pub struct PositionTable {
    files: Vec<PathBuf>,
    file_index: FxHashMap<PathBuf, u32>,
    positions: Vec<(u32, u32)>,
    pos_index: FxHashMap<(u32, u32), PosId>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file. Idempotent.
    pub fn register_file(&mut self, path: &Path) -> u32 {
        if let Some(&idx) = self.file_index.get(path) {
            return idx;
        }
        let idx = self.files.len() as u32;
        self.files.push(path.to_path_buf());
        self.file_index.insert(path.to_path_buf(), idx);
        idx
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.file_index.contains_key(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Intern a position. `None` for unregistered files or line 0, the
    /// table's notion of an invalid position.
    pub fn intern(&mut self, path: &Path, line: u32) -> Option<PosId> {
        if line == 0 {
            return None;
        }
        let &file_idx = self.file_index.get(path)?;
        let key = (file_idx, line);
        if let Some(&id) = self.pos_index.get(&key) {
            return Some(id);
        }
        let id = PosId(self.positions.len() as u32);
        self.positions.push(key);
        self.pos_index.insert(key, id);
        Some(id)
    }

    pub fn lookup(&self, id: PosId) -> Position {
        let (file_idx, line) = self.positions[id.0 as usize];
        Position {
            filename: self.files[file_idx as usize].clone(),
            line,
        }
    }

    /// Translate a raw `(file, line)` pair into this table's coordinates.
    /// `None` when the file is unknown to the table.
    pub fn translate(&self, path: &Path, line: u32) -> Option<Position> {
        if line == 0 || !self.file_index.contains_key(path) {
            return None;
        }
        Some(Position {
            filename: path.to_path_buf(),
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut table = PositionTable::new();
        table.register_file(Path::new("/src/a.go"));
        let first = table.intern(Path::new("/src/a.go"), 10).unwrap();
        let second = table.intern(Path::new("/src/a.go"), 10).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.lookup(first).line, 10);
    }

    #[test]
    fn unregistered_file_does_not_resolve() {
        let mut table = PositionTable::new();
        assert!(table.intern(Path::new("/src/missing.go"), 3).is_none());
        assert!(table.translate(Path::new("/src/missing.go"), 3).is_none());
    }

    #[test]
    fn line_zero_is_invalid() {
        let mut table = PositionTable::new();
        table.register_file(Path::new("/src/a.go"));
        assert!(table.intern(Path::new("/src/a.go"), 0).is_none());
    }

    #[test]
    fn translate_known_file() {
        let mut table = PositionTable::new();
        table.register_file(Path::new("/src/a.go"));
        let pos = table.translate(Path::new("/src/a.go"), 7).unwrap();
        assert_eq!(pos.filename, PathBuf::from("/src/a.go"));
        assert_eq!(pos.line, 7);
    }
}
