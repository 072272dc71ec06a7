//! A scriptable in-memory analyzer that records every call it receives.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::analyzer::{Analyzer, AnalyzerError, ContextOptions, GlobalOptions};
use crate::unsaved::UnsavedFile;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateContext(ContextOptions),
    Parse {
        path: PathBuf,
        args: Vec<String>,
        unsaved: usize,
    },
    Reparse {
        unit: u32,
        unsaved: usize,
    },
    DisposeUnit(u32),
    DisposeContext,
}

#[derive(Debug)]
pub(crate) struct FakeUnit {
    pub id: u32,
    pub reparses: u32,
}

/// Shared state the test keeps after handing the analyzer to the cache.
#[derive(Default)]
pub(crate) struct Log {
    calls: Mutex<Vec<Call>>,
    live: Mutex<BTreeSet<u32>>,
    next_id: AtomicU32,
    double_disposals: AtomicU32,
    global: AtomicU32,
    pub fail_context: AtomicBool,
    pub fail_parse: AtomicBool,
    pub fail_reparse: AtomicBool,
    pub fail_dispose: AtomicBool,
    pub panic_on_dispose: AtomicBool,
}

impl Log {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn parses(&self) -> usize {
        self.count(|c| matches!(c, Call::Parse { .. }))
    }

    pub fn reparses(&self) -> usize {
        self.count(|c| matches!(c, Call::Reparse { .. }))
    }

    pub fn unit_disposals(&self) -> usize {
        self.count(|c| matches!(c, Call::DisposeUnit(_)))
    }

    pub fn context_disposals(&self) -> usize {
        self.count(|c| matches!(c, Call::DisposeContext))
    }

    pub fn live_units(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn double_disposals(&self) -> u32 {
        self.double_disposals.load(Ordering::SeqCst)
    }

    pub fn last_parse_args(&self) -> Option<Vec<String>> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::Parse { args, .. } => Some(args),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub(crate) struct RecordingAnalyzer {
    log: Arc<Log>,
}

impl RecordingAnalyzer {
    pub fn new() -> (Self, Arc<Log>) {
        let log = Arc::new(Log::default());
        (
            Self {
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl Analyzer for RecordingAnalyzer {
    type Context = u32;
    type Unit = FakeUnit;

    fn create_context(&self, options: ContextOptions) -> Result<u32, AnalyzerError> {
        self.log.record(Call::CreateContext(options));
        if self.log.fail_context.load(Ordering::SeqCst) {
            return Err(AnalyzerError::new("out of memory"));
        }
        Ok(1)
    }

    fn parse(
        &self,
        _context: &u32,
        path: &Path,
        args: &[String],
        unsaved: &[UnsavedFile],
    ) -> Result<FakeUnit, AnalyzerError> {
        self.log.record(Call::Parse {
            path: path.to_path_buf(),
            args: args.to_vec(),
            unsaved: unsaved.len(),
        });
        if self.log.fail_parse.load(Ordering::SeqCst) {
            return Err(AnalyzerError::new("unknown argument"));
        }
        let id = self.log.next_id.fetch_add(1, Ordering::SeqCst);
        self.log.live.lock().unwrap().insert(id);
        Ok(FakeUnit { id, reparses: 0 })
    }

    fn reparse(&self, unit: &mut FakeUnit, unsaved: &[UnsavedFile]) -> Result<(), AnalyzerError> {
        self.log.record(Call::Reparse {
            unit: unit.id,
            unsaved: unsaved.len(),
        });
        if self.log.fail_reparse.load(Ordering::SeqCst) {
            return Err(AnalyzerError::new("reparse failed"));
        }
        unit.reparses += 1;
        Ok(())
    }

    fn dispose_unit(&self, unit: FakeUnit) -> Result<(), AnalyzerError> {
        self.log.record(Call::DisposeUnit(unit.id));
        let was_live = self.log.live.lock().unwrap().remove(&unit.id);
        if !was_live {
            self.log.double_disposals.fetch_add(1, Ordering::SeqCst);
        }
        if self.log.panic_on_dispose.load(Ordering::SeqCst) {
            panic!("analyzer crashed disposing unit {}", unit.id);
        }
        if self.log.fail_dispose.load(Ordering::SeqCst) {
            return Err(AnalyzerError::new("dispose failed"));
        }
        Ok(())
    }

    fn dispose_context(&self, _context: u32) -> Result<(), AnalyzerError> {
        self.log.record(Call::DisposeContext);
        if self.log.panic_on_dispose.load(Ordering::SeqCst) {
            panic!("analyzer crashed disposing index");
        }
        Ok(())
    }

    fn global_options(&self, _context: &u32) -> GlobalOptions {
        GlobalOptions::from_bits(self.log.global.load(Ordering::SeqCst))
    }

    fn set_global_options(&self, _context: &u32, options: GlobalOptions) {
        self.log.global.store(options.bits(), Ordering::SeqCst);
    }
}

/// Returns `UNIX_EPOCH + secs`.
pub(crate) fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Writes `path` (if missing) and sets its modification time.
pub(crate) fn touch(path: &Path, mtime: SystemTime) {
    if !path.exists() {
        std::fs::write(path, "int main() { return 0; }\n").unwrap();
    }
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

/// A provider whose answer the test can change between requests.
pub(crate) fn shared_args(initial: &[&str]) -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(initial.iter().map(|s| s.to_string()).collect()))
}

pub(crate) fn set_args(args: &Mutex<Vec<String>>, new: &[&str]) {
    *args.lock().unwrap() = new.iter().map(|s| s.to_string()).collect();
}
