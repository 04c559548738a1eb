//! Programs: sets of parsed source files analyzed together.
//!
//! Every file of a [`Program`] is parsed into one shared source map, so a
//! span identifies a node uniquely across the whole program. The bundled
//! standard library declarations are part of every program unless disabled.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use swc_common::{BytePos, SourceMap};
use swc_ecma_ast::{Module, ModuleDecl, ModuleItem};
use tracing::{debug, trace};

use crate::parser::{ParseError, Parser, is_declaration_file};
use crate::resolution::{candidate_paths, normalize_path};

/// Path under which the bundled standard library is registered.
pub const DEFAULT_LIB_PATH: &str = "/__tsgate__/lib.dom.d.ts";
const DEFAULT_LIB_SOURCE: &str = include_str!("../lib/lib.dom.d.ts");

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("Failed to read source file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

impl FileId {
    pub fn new(index: usize) -> Self {
        FileId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable identity of a program, used as the checker cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u64);

impl ProgramId {
    fn next() -> Self {
        ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

pub struct SourceFile {
    id: FileId,
    path: String,
    source: String,
    module: Option<Module>,
    errors: Vec<ParseError>,
    start_pos: BytePos,
    is_declaration: bool,
    is_default_lib: bool,
    line_starts: Vec<usize>,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("has_module", &self.module.is_some())
            .field("error_count", &self.errors.len())
            .finish()
    }
}

impl SourceFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn is_declaration(&self) -> bool {
        self.is_declaration
    }

    pub fn is_default_lib(&self) -> bool {
        self.is_default_lib
    }

    /// Byte offset of `pos` relative to the start of this file.
    pub fn offset_of(&self, pos: BytePos) -> u32 {
        pos.0.saturating_sub(self.start_pos.0)
    }

    /// 1-based line and column of a file-relative byte offset.
    pub fn line_col(&self, offset: u32) -> (usize, usize) {
        let offset = (offset as usize).min(self.source.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_index).copied().unwrap_or(0);
        let column = self
            .source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        (line_index + 1, column + 1)
    }

    /// Module specifiers of the file's imports and re-exports.
    pub fn import_specifiers(&self) -> Vec<String> {
        let Some(module) = &self.module else {
            return Vec::new();
        };

        module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    Some(import.src.value.to_string())
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)) => {
                    Some(export.src.value.to_string())
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export)) => {
                    export.src.as_ref().map(|src| src.value.to_string())
                }
                _ => None,
            })
            .collect()
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

pub struct Program {
    id: ProgramId,
    files: Vec<SourceFile>,
    by_path: HashMap<String, FileId>,
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.id)
            .field("files", &self.files.len())
            .finish()
    }
}

impl Program {
    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::new()
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    pub fn file_by_path(&self, path: &str) -> Option<&SourceFile> {
        self.by_path
            .get(&normalize_path(path))
            .map(|id| &self.files[id.0])
    }

    /// Files the user wrote: neither declaration files nor the bundled library.
    pub fn user_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files
            .iter()
            .filter(|f| !f.is_declaration && !f.is_default_lib)
    }

    /// Resolves an import specifier against the files of this program.
    pub fn resolve_module(&self, importer: FileId, specifier: &str) -> Option<FileId> {
        let importer = self.file(importer).path();
        candidate_paths(importer, specifier)
            .into_iter()
            .find_map(|candidate| self.by_path.get(&candidate).copied())
    }
}

#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    sources: Vec<(String, String)>,
    default_lib: bool,
    load_imports: bool,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            default_lib: true,
            load_imports: false,
        }
    }

    pub fn add_source(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.push((normalize_path(&path.into()), source.into()));
        self
    }

    pub fn add_file(self, path: &Path) -> Result<Self, ProgramError> {
        let source = std::fs::read_to_string(path).map_err(|e| ProgramError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(self.add_source(path.to_string_lossy(), source))
    }

    pub fn without_default_lib(mut self) -> Self {
        self.default_lib = false;
        self
    }

    /// Follows import specifiers to files on disk until no new file is found.
    pub fn load_imports(mut self, enabled: bool) -> Self {
        self.load_imports = enabled;
        self
    }

    pub fn build(self) -> Program {
        let source_map = SourceMap::default();
        let mut queue: VecDeque<(String, String, bool)> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();

        if self.default_lib {
            queued.insert(DEFAULT_LIB_PATH.to_string());
            queue.push_back((DEFAULT_LIB_PATH.to_string(), DEFAULT_LIB_SOURCE.to_string(), true));
        }
        for (path, source) in self.sources {
            if queued.insert(path.clone()) {
                queue.push_back((path, source, false));
            }
        }

        let mut files = Vec::new();
        let mut by_path = HashMap::new();

        while let Some((path, source, is_default_lib)) = queue.pop_front() {
            let id = FileId(files.len());
            let output = Parser::for_file(&path).parse_module(&source_map, &path, source.clone());
            let file = SourceFile {
                id,
                is_declaration: is_declaration_file(&path),
                is_default_lib,
                line_starts: line_starts(&source),
                path: path.clone(),
                source,
                module: output.node,
                errors: output.errors,
                start_pos: output.start_pos,
            };

            if self.load_imports && !is_default_lib {
                for specifier in file.import_specifiers() {
                    enqueue_from_disk(&path, &specifier, &mut queue, &mut queued);
                }
            }

            trace!(path = %file.path, errors = file.errors.len(), "parsed file");
            by_path.insert(path, id);
            files.push(file);
        }

        let program = Program {
            id: ProgramId::next(),
            files,
            by_path,
        };
        debug!(program = program.id.0, files = program.files.len(), "program built");
        program
    }
}

fn enqueue_from_disk(
    importer: &str,
    specifier: &str,
    queue: &mut VecDeque<(String, String, bool)>,
    queued: &mut HashSet<String>,
) {
    let candidates = candidate_paths(importer, specifier);
    if candidates.iter().any(|c| queued.contains(c)) {
        return;
    }

    for candidate in candidates {
        let Ok(source) = std::fs::read_to_string(&candidate) else {
            continue;
        };
        trace!(%importer, %specifier, resolved = %candidate, "loading imported module");
        queued.insert(candidate.clone());
        queue.push_back((candidate, source, false));
        return;
    }
}
