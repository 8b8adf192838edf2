//! File system watcher for template hot reload.
//!
//! Observes the layout, pages and components directories and recompiles the
//! whole template set on every change event (create, write, remove, rename).
//! Access events are ignored: compiling opens every watched file, so reacting
//! to them would recompile forever.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 Watcher Thread                         │
//! │                                                        │
//! │  ┌──────────┐    ┌──────────────────┐                  │
//! │  │ notify   │───▶│ registry.compile │──▶ Ok: swap set  │
//! │  │ events   │    └──────────────────┘                  │
//! │  └──────────┘             │                            │
//! │                           ▼ Err                        │
//! │                 ReloadPolicy::Abort → exit(1)          │
//! │                 ReloadPolicy::Keep  → keep old set     │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Registration is best-effort. Directories that cannot be watched are
//! collected into [`RegistrationErrors`]; the watcher only fails to start when
//! none of them could be registered.

use crate::{
    config::ReloadPolicy,
    log,
    registry::{TemplateError, TemplateRegistry},
};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind,
};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    thread,
};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Per-directory registration failures, aggregated.
#[derive(Debug, Default)]
pub struct RegistrationErrors {
    failures: Vec<(PathBuf, notify::Error)>,
}

impl RegistrationErrors {
    fn push(&mut self, path: PathBuf, err: notify::Error) {
        self.failures.push((path, err));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &notify::Error)> {
        self.failures.iter().map(|(path, err)| (path.as_path(), err))
    }
}

impl fmt::Display for RegistrationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, err)) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "`{}`: {err}", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for RegistrationErrors {}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create file watcher")]
    Create(#[source] notify::Error),

    #[error("no template directory could be watched: {0}")]
    Unregistered(RegistrationErrors),
}

// =============================================================================
// Watcher
// =============================================================================

/// Running watcher. Dropping it stops the event loop.
pub struct TemplateWatcher {
    _watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
    errors: Option<RegistrationErrors>,
}

impl fmt::Debug for TemplateWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateWatcher")
            .field("watched", &self.watched)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl TemplateWatcher {
    /// Register `dirs` recursively and spawn the event loop.
    pub fn start(
        registry: Arc<TemplateRegistry>,
        dirs: Vec<PathBuf>,
        policy: ReloadPolicy,
    ) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(tx).map_err(WatchError::Create)?;

        let mut watched = Vec::with_capacity(dirs.len());
        let mut errors = RegistrationErrors::default();
        for dir in dirs {
            match watcher.watch(&dir, RecursiveMode::Recursive) {
                Ok(()) => watched.push(dir),
                Err(err) => errors.push(dir, err),
            }
        }

        if watched.is_empty() {
            return Err(WatchError::Unregistered(errors));
        }
        for dir in &watched {
            log!("watch"; "watching {}", dir.display());
        }
        if !errors.is_empty() {
            log!("watch"; "some directories are not watched: {errors}");
        }

        thread::spawn(move || {
            // Ends once the watcher, and with it the sender, is dropped
            for result in rx {
                match result {
                    Ok(event) => handle_event(&registry, &event, policy),
                    Err(err) => log!("watch"; "watch error: {err}"),
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            watched,
            errors: (!errors.is_empty()).then_some(errors),
        })
    }

    /// Directories that were registered.
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Directories that failed to register, if any.
    pub fn registration_errors(&self) -> Option<&RegistrationErrors> {
        self.errors.as_ref()
    }
}

/// Whether an event means template sources may have changed.
fn is_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => false,
    }
}

fn handle_event(registry: &TemplateRegistry, event: &Event, policy: ReloadPolicy) {
    // A queue overflow drops events, so rescan means "anything may have changed"
    if !is_change(&event.kind) && !event.need_rescan() {
        return;
    }
    let trigger = event
        .paths
        .first()
        .map(|path| display_path(path, &registry.config().root))
        .unwrap_or_default();
    log!("watch"; "{:?} {trigger}, recompiling", event.kind);

    if let Err(err) = registry.compile() {
        on_reload_failure(&err, policy);
    }
}

fn on_reload_failure(err: &TemplateError, policy: ReloadPolicy) {
    log!("error"; "{}", error_chain(err));
    match policy {
        ReloadPolicy::Abort => {
            log!("error"; "template reload failed, exiting");
            std::process::exit(1);
        }
        ReloadPolicy::Keep => log!("watch"; "keeping previous templates"),
    }
}

/// `err: cause: cause` on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// `/srv/templates/pages/package.html` → `pages/package.html`
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::fixture::Fixture;
    use serde_json::json;
    use std::time::{Duration, Instant};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < TIMEOUT {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    fn registry(fixture: &Fixture) -> Arc<TemplateRegistry> {
        Arc::new(TemplateRegistry::load(fixture.config.clone(), Fixture::collaborators()).unwrap())
    }

    #[test]
    fn test_display_path() {
        assert_eq!(
            display_path(Path::new("/srv/t/pages/a.html"), Path::new("/srv/t")),
            "pages/a.html"
        );
        assert_eq!(display_path(Path::new("/other/a.html"), Path::new("/srv/t")), "/other/a.html");
    }

    #[test]
    fn test_is_change() {
        use notify::event::{
            AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode,
        };

        assert!(is_change(&EventKind::Create(CreateKind::File)));
        assert!(is_change(&EventKind::Remove(RemoveKind::File)));
        assert!(is_change(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(is_change(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));

        assert!(!is_change(&EventKind::Access(AccessKind::Open(AccessMode::Any))));
        assert!(!is_change(&EventKind::Access(AccessKind::Close(AccessMode::Write))));
        assert!(!is_change(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(!is_change(&EventKind::Any));
        assert!(!is_change(&EventKind::Other));
    }

    #[test]
    fn test_error_chain() {
        let err = TemplateError::Read {
            path: PathBuf::from("pages/a.html"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(
            error_chain(&err),
            "failed to read template source `pages/a.html`: gone"
        );
    }

    #[test]
    fn test_event_triggers_recompile() {
        let fixture = Fixture::new();
        let registry = registry(&fixture);
        let watcher = TemplateWatcher::start(
            Arc::clone(&registry),
            fixture.config.watch_dirs(),
            ReloadPolicy::Keep,
        )
        .unwrap();
        assert_eq!(watcher.watched().len(), 3);
        assert!(watcher.registration_errors().is_none());

        fixture.write("components/toast.html", r#"<p>{{ message }}</p>"#);
        let data = json!({"message": "new"});
        assert!(wait_for(|| {
            registry.generation() > 1
                && registry.render("toast", &data).ok().as_deref() == Some("<p>new</p>")
        }));
    }

    /// Wait until the generation stops moving for a while.
    fn settled_generation(registry: &TemplateRegistry) -> u64 {
        let start = Instant::now();
        let mut last = registry.generation();
        loop {
            thread::sleep(Duration::from_millis(300));
            let now = registry.generation();
            assert!(start.elapsed() < TIMEOUT, "still recompiling at generation {now}");
            if now == last {
                return now;
            }
            last = now;
        }
    }

    #[test]
    fn test_one_change_one_recompile() {
        let fixture = Fixture::new();
        let registry = registry(&fixture);
        let _watcher = TemplateWatcher::start(
            Arc::clone(&registry),
            fixture.config.watch_dirs(),
            ReloadPolicy::Keep,
        )
        .unwrap();
        assert_eq!(settled_generation(&registry), 1);

        // A rename into place is a single event
        let staged = fixture.dir.path().join("toast.staged");
        std::fs::write(&staged, "<p>{{ message }}</p>").unwrap();
        std::fs::rename(&staged, fixture.config.components_dir().join("toast.html")).unwrap();

        assert!(wait_for(|| registry.generation() > 1));
        assert_eq!(settled_generation(&registry), 2);
        assert_eq!(
            registry.render("toast", &json!({"message": "x"})).unwrap(),
            "<p>x</p>"
        );
    }

    #[test]
    fn test_compile_does_not_retrigger_itself() {
        let fixture = Fixture::new();
        let registry = registry(&fixture);
        let _watcher = TemplateWatcher::start(
            Arc::clone(&registry),
            fixture.config.watch_dirs(),
            ReloadPolicy::Keep,
        )
        .unwrap();

        fixture.write("components/toast.html", "<b>{{ message }}</b>");
        assert!(wait_for(|| registry.generation() > 1));
        let settled = settled_generation(&registry);
        // Truncate and write may arrive as separate modify events
        assert!(settled <= 3, "one write produced {} recompiles", settled - 1);

        registry.compile().unwrap();
        assert_eq!(settled_generation(&registry), settled + 1);
    }

    #[test]
    fn test_keep_policy_survives_broken_source() {
        let fixture = Fixture::new();
        let registry = registry(&fixture);
        let _watcher = TemplateWatcher::start(
            Arc::clone(&registry),
            fixture.config.watch_dirs(),
            ReloadPolicy::Keep,
        )
        .unwrap();

        fixture.write("pages/packages.html", "{% if %}");
        thread::sleep(Duration::from_millis(200));
        assert!(registry.get("packages").is_some());

        fixture.write("pages/packages.html", "fixed");
        assert!(wait_for(|| {
            registry.render("packages", &json!({})).ok().as_deref() == Some("fixed")
        }));
    }

    #[test]
    fn test_partial_registration() {
        let fixture = Fixture::new();
        let registry = registry(&fixture);
        let missing = fixture.dir.path().join("missing");
        let dirs = vec![fixture.config.pages_dir(), missing.clone()];

        let watcher = TemplateWatcher::start(registry, dirs, ReloadPolicy::Keep).unwrap();
        assert_eq!(watcher.watched(), &[fixture.config.pages_dir()]);

        let errors = watcher.registration_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().0, missing.as_path());
        assert!(errors.to_string().contains("missing"));
    }

    #[test]
    fn test_nothing_registered_fails() {
        let fixture = Fixture::new();
        let registry = registry(&fixture);
        let dirs = vec![
            fixture.dir.path().join("a"),
            fixture.dir.path().join("b"),
        ];

        match TemplateWatcher::start(registry, dirs, ReloadPolicy::Keep) {
            Err(WatchError::Unregistered(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected Unregistered, got {other:?}"),
        }
    }
}
