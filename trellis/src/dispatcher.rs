//! The dispatcher: public entry point, module registry, and scheduling.
//!
//! One [`Dispatcher`] exists per application id, held in a process-wide
//! registry that is populated on construction and never torn down. The
//! dispatcher owns the application's module tree; a dispatch pass locks the
//! tree for its full depth-first walk, so passes are serialized. A dispatch
//! started while a walk is active — including an action re-entering its own
//! dispatcher — is parked and runs as soon as the active walk finishes,
//! before the tree is released.

use crate::engine;
use crate::presence::{PresenceChecker, PresenceOverride};
use crate::settings::Settings;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, RwLock, TryLockError};
use std::time::Duration;
use trellis_types::error::DispatchError;
use trellis_types::id::AppId;
use trellis_types::node::{ModuleNode, NodeValue, Payload};
use trellis_types::presence::{NullOracle, PresenceOracle};
use trellis_types::ready::{ImmediateReady, Job, ReadySignal};
use trellis_types::schedule::{InlineScheduler, Scheduler};

/// Construction options for a [`Dispatcher`].
///
/// Collaborators left at `None` fall back to the inert defaults: an oracle
/// that reports nothing present, an always-ready signal, and an inline
/// scheduler.
#[derive(Default)]
pub struct Options {
    /// Dispatcher settings; see [`Settings::with_patch`] for JSON patches.
    pub settings: Settings,
    /// The environment presence oracle.
    pub oracle: Option<Arc<dyn PresenceOracle>>,
    /// The environment ready signal.
    pub ready: Option<Arc<dyn ReadySignal>>,
    /// The queue-delay scheduler.
    pub scheduler: Option<Arc<dyn Scheduler>>,
    /// Full replacement for the default presence behavior.
    pub presence_override: Option<PresenceOverride>,
}

/// Options for one dispatch pass.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Payload handed to predicate rules and actions.
    pub data: Option<Payload>,
    /// Dispatch only this module (slash path), starting at depth 1, instead
    /// of the whole registry.
    pub module_id: Option<String>,
    /// Bypass activation rules and budget for the entry node. Not inherited
    /// by children.
    pub force: bool,
}

/// The conditional-activation dispatcher for one application.
pub struct Dispatcher {
    id: AppId,
    settings: Settings,
    checker: PresenceChecker,
    ready: Arc<dyn ReadySignal>,
    scheduler: Arc<dyn Scheduler>,
    root: Mutex<ModuleNode>,
    pending: Mutex<VecDeque<DispatchOptions>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn registry() -> &'static RwLock<HashMap<String, Arc<Dispatcher>>> {
    static APPS: OnceLock<RwLock<HashMap<String, Arc<Dispatcher>>>> = OnceLock::new();
    APPS.get_or_init(|| RwLock::new(HashMap::new()))
}

impl Dispatcher {
    /// Create a dispatcher and register it process-wide under `id`.
    ///
    /// Registering an id that is already taken replaces the registry entry;
    /// holders of the previous instance keep it. An empty id is an error.
    pub fn new(id: impl Into<String>, options: Options) -> Result<Arc<Self>, DispatchError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DispatchError::EmptyAppId);
        }
        let oracle = options.oracle.unwrap_or_else(|| Arc::new(NullOracle));
        let checker = PresenceChecker::new(
            options.settings.presence.clone(),
            oracle,
            options.presence_override,
        );
        let app = Arc::new(Self {
            id: AppId::new(id.clone()),
            settings: options.settings,
            checker,
            ready: options.ready.unwrap_or_else(|| Arc::new(ImmediateReady)),
            scheduler: options.scheduler.unwrap_or_else(|| Arc::new(InlineScheduler)),
            root: Mutex::new(ModuleNode::new()),
            pending: Mutex::new(VecDeque::new()),
        });
        registry()
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::clone(&app));
        Ok(app)
    }

    /// Look an application's dispatcher up in the process-wide registry.
    pub fn app(id: &str) -> Result<Arc<Self>, DispatchError> {
        registry()
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| DispatchError::AppNotFound(id.to_owned()))
    }

    /// This dispatcher's application id.
    pub fn id(&self) -> &AppId {
        &self.id
    }

    /// This dispatcher's settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Presence of a single identifier; see [`PresenceChecker::is_present`].
    pub fn is_present(&self, id: &str, raw: bool) -> Option<String> {
        self.checker.is_present(&[id], raw)
    }

    /// Presence of the first of several identifiers.
    pub fn is_present_any(&self, ids: &[&str], raw: bool) -> Option<String> {
        self.checker.is_present(ids, raw)
    }

    /// Register a module body under a slash-delimited path, creating
    /// intermediate module nodes as needed.
    pub fn set_module(&self, path: &str, body: ModuleNode) -> Result<(), DispatchError> {
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());
        let (parent, key) = descend_create(&mut root, path)?;
        parent.entries.insert(key, NodeValue::Module(body));
        Ok(())
    }

    /// Read access to the module at `path`.
    pub fn with_module<R>(
        &self,
        path: &str,
        f: impl FnOnce(&ModuleNode) -> R,
    ) -> Result<R, DispatchError> {
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());
        let (value, key) = lookup_mut(&mut root, path)?;
        match value {
            NodeValue::Module(node) => Ok(f(node)),
            other => Err(DispatchError::NotAModule {
                module_id: path.to_owned(),
                key,
                kind: other.kind(),
            }),
        }
    }

    /// Start a dispatch pass.
    ///
    /// With `module_id` set, only that module's subtree is traversed,
    /// entered at depth 1; otherwise the whole registry is walked from
    /// depth 0. Scheduling only decides *when* the pass enters the tree:
    /// with a queue delay configured the pass is handed to the scheduler,
    /// and with `await_ready` on it additionally waits for the environment.
    /// The fully synchronous path propagates errors; a deferred pass logs
    /// its failure instead, since the caller is long gone.
    ///
    /// Calling this while a pass is already walking the tree — an action
    /// triggering a follow-up pass is the common case — parks the new pass;
    /// it runs right after the active walk, and any failure is logged.
    pub fn dispatch(self: &Arc<Self>, opts: DispatchOptions) -> Result<(), DispatchError> {
        let policy = &self.settings.dispatch;
        if !policy.await_ready && policy.queue.is_none() {
            return self.run_pass(&opts);
        }

        let this = Arc::clone(self);
        let job: Job = Box::new(move || {
            if let Err(error) = this.run_pass(&opts) {
                tracing::error!(app = %this.id, %error, "deferred dispatch pass failed");
            }
        });
        let job: Job = match policy.queue {
            Some(millis) => {
                let scheduler = Arc::clone(&self.scheduler);
                Box::new(move || scheduler.schedule(Duration::from_millis(millis), job))
            }
            None => job,
        };
        if policy.await_ready {
            self.ready.on_ready(job);
        } else {
            job();
        }
        Ok(())
    }

    fn run_pass(&self, opts: &DispatchOptions) -> Result<(), DispatchError> {
        tracing::debug!(
            app = %self.id,
            module = opts.module_id.as_deref().unwrap_or("*"),
            force = opts.force,
            "dispatch pass"
        );
        let mut root = match self.root.try_lock() {
            Ok(root) => root,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => {
                // A pass is already walking this tree, possibly this very
                // thread's own — an action re-entering `dispatch` lands
                // here. Park the pass; the active walk drains the queue
                // before releasing the tree.
                self.pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push_back(opts.clone());
                tracing::debug!(app = %self.id, "pass parked behind the active walk");
                // The walk may have finished between the failed lock and
                // the park; pick the queue back up in that case.
                if let Ok(mut root) = self.root.try_lock() {
                    self.drain_parked(&mut root);
                }
                return Ok(());
            }
        };
        let result = self.walk(&mut root, opts);
        self.drain_parked(&mut root);
        result
    }

    /// One traversal of the (already locked) tree.
    fn walk(&self, root: &mut ModuleNode, opts: &DispatchOptions) -> Result<(), DispatchError> {
        let pass = engine::Pass {
            app: self.id.as_str(),
            checker: &self.checker,
            payload: opts.data.as_ref(),
        };
        match opts.module_id.as_deref() {
            Some(path) => {
                let (value, _) = lookup_mut(root, path)?;
                engine::run(&pass, value, opts.force, 1, path, path, path, None)
            }
            None => engine::run_node(&pass, root, opts.force, 0, "", "", "", None),
        }
    }

    /// Run every parked pass, in park order, under the held tree lock.
    ///
    /// A parked pass has no caller left on the stack to receive an error,
    /// so failures are logged, the same as other deferred passes.
    fn drain_parked(&self, root: &mut ModuleNode) {
        loop {
            let next = self
                .pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            let Some(next) = next else { return };
            if let Err(error) = self.walk(root, &next) {
                tracing::error!(app = %self.id, %error, "parked dispatch pass failed");
            }
        }
    }
}

fn split_path(path: &str) -> Result<(Vec<&str>, &str), DispatchError> {
    if path.is_empty() {
        return Err(DispatchError::EmptyModulePath);
    }
    let segments: Vec<&str> = path.split('/').collect();
    match segments.split_last() {
        Some((last, parents)) => Ok((parents.to_vec(), last)),
        None => Err(DispatchError::EmptyModulePath),
    }
}

/// Walk to the parent of `path`, creating intermediate module nodes, and
/// return it with the final key.
fn descend_create<'a>(
    root: &'a mut ModuleNode,
    path: &str,
) -> Result<(&'a mut ModuleNode, String), DispatchError> {
    let (parents, last) = split_path(path)?;
    let mut node = root;
    for seg in parents {
        let current = node;
        let value = current
            .entries
            .entry(seg.to_owned())
            .or_insert_with(|| NodeValue::Module(ModuleNode::new()));
        match value {
            NodeValue::Module(child) => node = child,
            other => {
                return Err(DispatchError::NotAModule {
                    module_id: path.to_owned(),
                    key: seg.to_owned(),
                    kind: other.kind(),
                })
            }
        }
    }
    Ok((node, last.to_owned()))
}

/// Walk to the value at `path` without creating anything. Returns the value
/// together with its final key.
fn lookup_mut<'a>(
    root: &'a mut ModuleNode,
    path: &str,
) -> Result<(&'a mut NodeValue, String), DispatchError> {
    let (parents, last) = split_path(path)?;
    let mut node = root;
    for seg in parents {
        let current = node;
        match current.entries.get_mut(seg) {
            Some(NodeValue::Module(child)) => node = child,
            _ => return Err(DispatchError::ModuleNotFound(path.to_owned())),
        }
    }
    match node.entries.get_mut(last) {
        Some(value) => Ok((value, last.to_owned())),
        None => Err(DispatchError::ModuleNotFound(path.to_owned())),
    }
}
