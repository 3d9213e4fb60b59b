//! I/O redirection table.
//!
//! Call sites that open data files go through an [`IoTable`] instead of
//! calling `File::open` directly. Each `(module, function)` entry binds a
//! logical opener name to an implementation, and an entry can be
//! *intercepted*: the next call records its target before running the
//! original opener.
//!
//! While the original opener runs, the entry is deactivated, so calls the
//! opener makes through the table itself reach the true original. A
//! [`Rearm::Once`] interception stays off afterwards; [`Rearm::Always`]
//! reinstates itself once the call returns, whether it succeeded or not.

mod openers;

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use crate::error::InterceptError;

pub use openers::{open_bz2, open_gzip, open_hdf5, open_plain};

/// An open-like function taking a filename.
pub type Opener = Arc<dyn Fn(&Path) -> std::io::Result<File> + Send + Sync>;

/// Default file opener.
pub const IO_OPEN: (&str, &str) = ("io", "open");
/// HDF5 file opener.
pub const HDF5_FILE: (&str, &str) = ("hdf5", "File");
/// bzip2 file opener.
pub const BZ2_FILE: (&str, &str) = ("bz2", "BZ2File");
/// gzip file opener.
pub const GZIP_FILE: (&str, &str) = ("gzip", "GzipFile");

/// Openers intercepted in virtual file-system mode.
pub const VFS_OPENERS: [(&str, &str); 4] = [IO_OPEN, HDF5_FILE, BZ2_FILE, GZIP_FILE];

/// What happens to an interception after the call it intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rearm {
    /// Intercept only the next call, then leave the original bound.
    #[default]
    Once,
    /// Reinstate the interception after every call.
    Always,
}

/// Outcome of [`IoTable::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Installed,
    /// The entry was already intercepted; nothing was stacked on top.
    AlreadyActive,
}

/// Bookkeeping for one intercepted call.
#[derive(Debug, Clone, PartialEq)]
pub struct Intercepted {
    pub module: String,
    pub function: String,
    pub target: PathBuf,
    pub at: DateTime<Utc>,
}

struct Binding {
    original: Opener,
    interception: Option<Rearm>,
}

type Modules = HashMap<String, HashMap<String, Binding>>;

/// Table of logical opener names to implementations.
#[derive(Default)]
pub struct IoTable {
    modules: Mutex<Modules>,
    log: Mutex<Vec<Intercepted>>,
}

impl std::fmt::Debug for IoTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let modules = self.modules.lock().expect("io table lock poisoned");
        let entries: BTreeMap<String, Option<Rearm>> = modules
            .iter()
            .flat_map(|(module, functions)| {
                functions
                    .iter()
                    .map(move |(function, b)| (format!("{module}.{function}"), b.interception))
            })
            .collect();
        f.debug_struct("IoTable").field("entries", &entries).finish()
    }
}

impl IoTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with the plain opener and the three format-specific openers.
    pub fn with_defaults() -> Self {
        let table = Self::new();
        table.register(IO_OPEN.0, IO_OPEN.1, Arc::new(|p: &Path| open_plain(p)));
        table.register(HDF5_FILE.0, HDF5_FILE.1, Arc::new(|p: &Path| open_hdf5(p)));
        table.register(BZ2_FILE.0, BZ2_FILE.1, Arc::new(|p: &Path| open_bz2(p)));
        table.register(GZIP_FILE.0, GZIP_FILE.1, Arc::new(|p: &Path| open_gzip(p)));
        table
    }

    /// Bind `module.function` to `opener`, replacing any previous binding
    /// and dropping its interception.
    pub fn register(&self, module: &str, function: &str, opener: Opener) {
        let mut modules = self.modules.lock().expect("io table lock poisoned");
        modules.entry(module.to_string()).or_default().insert(
            function.to_string(),
            Binding {
                original: opener,
                interception: None,
            },
        );
    }

    /// Intercept the next call to `module.function`.
    pub fn activate(&self, module: &str, function: &str) -> Result<Activation, InterceptError> {
        self.activate_with(module, function, Rearm::Once)
    }

    /// Intercept calls to `module.function` with the given rearm policy.
    ///
    /// An entry that is already intercepted keeps its current policy.
    pub fn activate_with(
        &self,
        module: &str,
        function: &str,
        rearm: Rearm,
    ) -> Result<Activation, InterceptError> {
        let mut modules = self.modules.lock().expect("io table lock poisoned");
        let binding = lookup(&mut modules, module, function)?;
        if binding.interception.is_some() {
            tracing::debug!("{}.{} already intercepted", module, function);
            return Ok(Activation::AlreadyActive);
        }
        binding.interception = Some(rearm);
        tracing::debug!("Intercepting {}.{} ({:?})", module, function, rearm);
        Ok(Activation::Installed)
    }

    /// Restore the original binding. Returns whether an interception was removed.
    pub fn deactivate(&self, module: &str, function: &str) -> Result<bool, InterceptError> {
        let mut modules = self.modules.lock().expect("io table lock poisoned");
        let binding = lookup(&mut modules, module, function)?;
        Ok(binding.interception.take().is_some())
    }

    pub fn is_active(&self, module: &str, function: &str) -> Result<bool, InterceptError> {
        let mut modules = self.modules.lock().expect("io table lock poisoned");
        Ok(lookup(&mut modules, module, function)?.interception.is_some())
    }

    /// Open `path` with whatever `module.function` is currently bound to.
    pub fn call(&self, module: &str, function: &str, path: &Path) -> Result<File, InterceptError> {
        let (original, interception) = {
            let mut modules = self.modules.lock().expect("io table lock poisoned");
            let binding = lookup(&mut modules, module, function)?;
            // Deactivate before the original runs so its own calls are not intercepted.
            (binding.original.clone(), binding.interception.take())
        };

        let Some(rearm) = interception else {
            return Ok(original(path)?);
        };

        let _guard = Reactivate {
            table: self,
            module,
            function,
            rearm,
        };
        self.record(module, function, path);
        Ok(original(path)?)
    }

    /// Open with the default opener.
    pub fn open(&self, path: &Path) -> Result<File, InterceptError> {
        self.call(IO_OPEN.0, IO_OPEN.1, path)
    }

    /// Every intercepted call so far, oldest first.
    pub fn intercepted(&self) -> Vec<Intercepted> {
        self.log.lock().expect("io log lock poisoned").clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().expect("io log lock poisoned").clear();
    }

    fn record(&self, module: &str, function: &str, path: &Path) {
        tracing::info!("{}.{} intercepted: {}", module, function, path.display());
        self.log
            .lock()
            .expect("io log lock poisoned")
            .push(Intercepted {
                module: module.to_string(),
                function: function.to_string(),
                target: path.to_path_buf(),
                at: Utc::now(),
            });
    }
}

fn lookup<'a>(
    modules: &'a mut Modules,
    module: &str,
    function: &str,
) -> Result<&'a mut Binding, InterceptError> {
    let functions = modules
        .get_mut(module)
        .ok_or_else(|| InterceptError::UnknownModule(module.to_string()))?;
    functions
        .get_mut(function)
        .ok_or_else(|| InterceptError::UnknownFunction {
            module: module.to_string(),
            function: function.to_string(),
        })
}

/// Reinstates a [`Rearm::Always`] interception when the intercepted call
/// returns or unwinds.
struct Reactivate<'a> {
    table: &'a IoTable,
    module: &'a str,
    function: &'a str,
    rearm: Rearm,
}

impl Drop for Reactivate<'_> {
    fn drop(&mut self) {
        if self.rearm != Rearm::Always {
            return;
        }
        // A poisoned lock here means another thread panicked mid-update; leave it.
        if let Ok(mut modules) = self.table.modules.lock() {
            if let Ok(binding) = lookup(&mut modules, self.module, self.function) {
                binding.interception.get_or_insert(Rearm::Always);
            }
        }
    }
}
