use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fs,
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    collection::{Collection, FileId, FileImport},
    error::{Error, Location},
    parser::parse_schema,
    tokenizer::tokenize_schema,
    types::Import,
};

/// A strategy for locating and reading schema files.
///
/// [`FsSource`] searches include directories on disk; [`MemorySource`]
/// serves files from a map, which keeps tests off the file system.
pub trait SchemaSource {
    /// Maps a requested name to the canonical path identifying the file.
    /// Two names resolving to the same path denote the same file.
    fn resolve(&self, name: &str) -> Result<PathBuf, Error>;

    /// Reads a file previously returned by [`SchemaSource::resolve`].
    fn read(&self, path: &Path) -> Result<String, Error>;
}

impl<T: SchemaSource + ?Sized> SchemaSource for &T {
    fn resolve(&self, name: &str) -> Result<PathBuf, Error> {
        (**self).resolve(name)
    }

    fn read(&self, path: &Path) -> Result<String, Error> {
        (**self).read(path)
    }
}

/// Looks files up under an ordered list of include directories; the first
/// directory containing the file wins.
#[derive(Debug, Clone, Default)]
pub struct FsSource {
    include_paths: Vec<PathBuf>,
}

impl FsSource {
    pub fn new<I, P>(include_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        FsSource {
            include_paths: include_paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl SchemaSource for FsSource {
    fn resolve(&self, name: &str) -> Result<PathBuf, Error> {
        let requested = Path::new(name);
        let canonicalize = |candidate: &Path| {
            fs::canonicalize(candidate).map_err(|err| import_error(name, "cannot open file", Some(err)))
        };

        if requested.is_absolute() {
            return canonicalize(requested);
        }
        for root in &self.include_paths {
            let candidate = root.join(requested);
            if candidate.is_file() {
                return canonicalize(&candidate);
            }
        }

        let searched = self
            .include_paths
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(import_error(
            name,
            &format!("file not found in include paths [{}]", searched),
            None,
        ))
    }

    fn read(&self, path: &Path) -> Result<String, Error> {
        fs::read_to_string(path).map_err(|err| {
            import_error(&path.display().to_string(), "cannot read file", Some(err))
        })
    }
}

/// Serves schema text from memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.files.insert(name.into(), text.into());
        self
    }
}

impl SchemaSource for MemorySource {
    fn resolve(&self, name: &str) -> Result<PathBuf, Error> {
        let name = name.trim_start_matches("./");
        if self.files.contains_key(name) {
            Ok(PathBuf::from(name))
        } else {
            Err(import_error(name, "file not found", None))
        }
    }

    fn read(&self, path: &Path) -> Result<String, Error> {
        let key = path.to_string_lossy();
        self.files
            .get(key.as_ref())
            .cloned()
            .ok_or_else(|| import_error(&key, "file not found", None))
    }
}

fn import_error(name: &str, reason: &str, source: Option<io::Error>) -> Error {
    Error::ImportResolution {
        name: name.to_string(),
        importer: None,
        reason: reason.to_string(),
        source,
    }
}

/// State for one import resolution run: which files were already parsed,
/// and which parsed files still have imports to follow.
pub struct ImportContext<S> {
    source:     S,
    memo:       HashMap<PathBuf, FileId>,
    worklist:   VecDeque<(FileId, Vec<Import>)>,
    collection: Collection,
}

impl<S: SchemaSource> ImportContext<S> {
    pub fn new(source: S) -> Self {
        ImportContext {
            source,
            memo: HashMap::new(),
            worklist: VecDeque::new(),
            collection: Collection::default(),
        }
    }

    /// Adds a file requested directly by the caller, then follows its
    /// imports. A file already reached through an import is promoted.
    pub fn add_primary(&mut self, name: &str) -> Result<FileId, Error> {
        let id = self.request(name, None)?;
        self.drain()?;
        Ok(id)
    }

    pub fn finish(self) -> Collection {
        self.collection
    }

    fn request(&mut self, name: &str, importer: Option<&Location>) -> Result<FileId, Error> {
        let attach = |err: Error| match err {
            Error::ImportResolution { name, importer: None, reason, source } => Error::ImportResolution {
                name,
                importer: importer.cloned(),
                reason,
                source,
            },
            other => other,
        };

        let path = self.source.resolve(name).map_err(attach)?;
        if let Some(&id) = self.memo.get(&path) {
            if importer.is_none() {
                self.collection.files[id.0].imported = false;
            }
            return Ok(id);
        }

        info!("Parsing {}", path.display());
        let text = self.source.read(&path).map_err(attach)?;
        let tokens = tokenize_schema(&text, &path)?;
        let mut schema = parse_schema(&tokens, &path)?;

        let imports = std::mem::take(&mut schema.imports);
        let id = self.collection.add_file(name, schema, importer.is_some());
        self.memo.insert(path, id);
        self.worklist.push_back((id, imports));
        Ok(id)
    }

    fn drain(&mut self) -> Result<(), Error> {
        while let Some((id, imports)) = self.worklist.pop_front() {
            for import in imports {
                debug!("{}: following import {:?}", import.location, import.path);
                let target = self.request(&import.path, Some(&import.location))?;
                if target == id {
                    debug!("{}: ignoring self-import", import.location);
                    continue;
                }
                self.collection.files[id.0].imports.push(FileImport {
                    file: target,
                    kind: import.kind,
                });
            }
        }
        Ok(())
    }
}

/// Parses `entries` and everything they import into one [`Collection`].
///
/// Each file is parsed exactly once no matter how many times it is
/// reached. The first error aborts the whole run.
pub fn resolve_imports<S, I, N>(source: S, entries: I) -> Result<Collection, Error>
where
    S: SchemaSource,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut context = ImportContext::new(source);
    for entry in entries {
        context.add_primary(entry.as_ref())?;
    }
    Ok(context.finish())
}
