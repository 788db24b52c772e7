//! Engine construction and the scan, resolve and undo operations.

use crate::core::fingerprint::{
    FailureDisposition, FingerprintStrategy, HashAlgorithmKind, StrategyConfig, VideoHashMode,
};
use crate::core::grouper::{
    group_files_with_events, DuplicateGroup, FingerprintedFile, SimilarityThresholds,
    ThresholdStrategy,
};
use crate::core::oplog::{ErrorLog, LogConfig, OperationLog};
use crate::core::quality::{QualityRanker, RelocationPlan, DEFAULT_THUMBNAIL_MAX_SIDE};
use crate::core::relocation::{
    FileMover, RelocationConfig, RelocationExecutor, RelocationReport, StdMover,
};
use crate::core::scanner::{FileRecord, MediaCategory, ScanConfig, WalkDirScanner};
use crate::core::undo::{Undo, UndoOutcome};
use crate::error::{Result, ScanError};
use crate::events::{
    null_sender, EngineEvent, EnginePhase, Event, EventSender, FingerprintEvent,
    FingerprintProgress, RelocateEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// A file that could not be fingerprinted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintFailure {
    pub record: FileRecord,
    pub message: String,
    /// Whether the file should be quarantined or left alone
    pub disposition: FailureDisposition,
}

/// Result of scanning and grouping one tree
#[derive(Debug)]
pub struct ScanOutcome {
    /// Duplicate groups in discovery order
    pub groups: Vec<DuplicateGroup>,
    /// Files excluded from grouping
    pub failures: Vec<FingerprintFailure>,
    /// Files that matched the extension set
    pub total_files: usize,
    /// Directory entries that could not be read
    pub scan_errors: Vec<ScanError>,
    pub duration_ms: u64,
}

impl ScanOutcome {
    /// Failures that should be moved to quarantine
    pub fn quarantinable(&self) -> impl Iterator<Item = &FingerprintFailure> {
        self.failures
            .iter()
            .filter(|f| f.disposition == FailureDisposition::Quarantine)
    }
}

/// Configuration for the engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub scan: ScanConfig,
    pub strategy: StrategyConfig,
    pub thresholds: SimilarityThresholds,
    pub relocation: RelocationConfig,
    pub logs: LogConfig,
    /// Largest side of an image treated as a thumbnail
    pub thumbnail_max_side: Option<u32>,
}

/// Builder for engine configuration
pub struct EngineBuilder {
    config: EngineConfig,
    mover: Option<Box<dyn FileMover>>,
    strategies: HashMap<MediaCategory, Box<dyn FingerprintStrategy>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            mover: None,
            strategies: HashMap::new(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan = config;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan.include_hidden = include;
        self
    }

    /// Directories never scanned, typically the destination
    pub fn exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scan.excluded_dirs.push(dir.into());
        self
    }

    pub fn strategy_config(mut self, config: StrategyConfig) -> Self {
        self.config.strategy = config;
        self
    }

    /// Image hash algorithms; all must agree for a match
    pub fn algorithms(mut self, algorithms: impl IntoIterator<Item = HashAlgorithmKind>) -> Self {
        self.config.strategy = self.config.strategy.algorithms(algorithms);
        self
    }

    pub fn video_mode(mut self, mode: VideoHashMode) -> Self {
        self.config.strategy = self.config.strategy.video_mode(mode);
        self
    }

    pub fn thresholds(mut self, thresholds: SimilarityThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn relocation_config(mut self, config: RelocationConfig) -> Self {
        self.config.relocation = config;
        self
    }

    pub fn log_config(mut self, config: LogConfig) -> Self {
        self.config.logs = config;
        self
    }

    /// Keep both logs in `dir` with their default names
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.logs.dir = dir.into();
        self
    }

    pub fn thumbnail_max_side(mut self, side: u32) -> Self {
        self.config.thumbnail_max_side = Some(side);
        self
    }

    /// Move files with a custom mover instead of the filesystem default
    pub fn mover(mut self, mover: Box<dyn FileMover>) -> Self {
        self.mover = Some(mover);
        self
    }

    /// Use a specific fingerprint strategy for one category
    pub fn strategy(
        mut self,
        category: MediaCategory,
        strategy: Box<dyn FingerprintStrategy>,
    ) -> Self {
        self.strategies.insert(category, strategy);
        self
    }

    /// Create the log directory and build the engine
    pub fn build(self) -> Result<Engine> {
        let (operations, errors) = self.config.logs.open()?;
        debug!(dir = %self.config.logs.dir.display(), "log directory ready");

        let executor = RelocationExecutor::new(
            self.config.relocation.clone(),
            self.mover.unwrap_or_else(|| Box::new(StdMover)),
            operations.clone(),
            errors.clone(),
        );

        let ranker = QualityRanker::new().thumbnail_max_side(
            self.config
                .thumbnail_max_side
                .unwrap_or(DEFAULT_THUMBNAIL_MAX_SIDE),
        );

        Ok(Engine {
            comparison: ThresholdStrategy::new(self.config.thresholds),
            config: self.config,
            operations,
            errors,
            executor,
            ranker,
            strategies: self.strategies,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The duplicate detection and resolution engine
pub struct Engine {
    config: EngineConfig,
    operations: OperationLog,
    errors: ErrorLog,
    executor: RelocationExecutor,
    comparison: ThresholdStrategy,
    ranker: QualityRanker,
    strategies: HashMap<MediaCategory, Box<dyn FingerprintStrategy>>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn operation_log(&self) -> &OperationLog {
        &self.operations
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    /// Find duplicate groups among files with the given extensions
    pub fn scan_and_group<I, S>(
        &self,
        root: &Path,
        category: MediaCategory,
        extensions: I,
    ) -> Result<ScanOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scan_and_group_with_events(root, category, extensions, &null_sender())
    }

    pub fn scan_and_group_with_events<I, S>(
        &self,
        root: &Path,
        category: MediaCategory,
        extensions: I,
        events: &EventSender,
    ) -> Result<ScanOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = Instant::now();
        let built;
        let strategy: &dyn FingerprintStrategy = match self.strategies.get(&category) {
            Some(strategy) => strategy.as_ref(),
            None => {
                built = self.config.strategy.build(category)?;
                built.as_ref()
            }
        };

        // Phase 1: discover files
        phase(events, EnginePhase::Scanning);
        let scanner = WalkDirScanner::new(self.config.scan.clone(), extensions);
        let scan = scanner.scan_with_events(root, category, events)?;
        for error in &scan.errors {
            self.errors.record(error.path(), &error.reason())?;
        }
        let total_files = scan.files.len();
        info!(root = %root.display(), %category, total_files, "scan complete");

        // Phase 2: fingerprint
        phase(events, EnginePhase::Fingerprinting);
        events.send(Event::Fingerprint(FingerprintEvent::Started { total_files }));

        let mut fingerprinted = Vec::with_capacity(total_files);
        let mut failures = Vec::new();

        for (i, record) in scan.files.into_iter().enumerate() {
            match strategy.analyze(&record) {
                Ok(analysis) => {
                    debug!(path = %record.path.display(), strategy = strategy.name(), "fingerprinted");
                    events.send(Event::Fingerprint(FingerprintEvent::Progress(
                        FingerprintProgress {
                            completed: i + 1,
                            total: total_files,
                            current_path: record.path.clone(),
                        },
                    )));
                    fingerprinted.push(FingerprintedFile {
                        record,
                        fingerprint: analysis.fingerprint,
                        quality: analysis.quality,
                    });
                }
                Err(error) => {
                    let message = error.reason();
                    self.errors.record(&record.path, &message)?;
                    events.send(Event::Fingerprint(FingerprintEvent::Failed {
                        path: record.path.clone(),
                        message: message.clone(),
                    }));
                    failures.push(FingerprintFailure {
                        record,
                        message,
                        disposition: strategy.failure_disposition(),
                    });
                }
            }
        }

        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            total_fingerprinted: fingerprinted.len(),
            failures: failures.len(),
        }));

        // Phase 3: group
        phase(events, EnginePhase::Grouping);
        let groups = group_files_with_events(
            strategy.grouping(),
            &self.comparison,
            fingerprinted,
            events,
        );
        info!(groups = groups.len(), failures = failures.len(), "grouping complete");

        Ok(ScanOutcome {
            groups,
            failures,
            total_files,
            scan_errors: scan.errors,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Keep/move decisions for each group, without touching the filesystem
    pub fn plan(&self, groups: &[DuplicateGroup]) -> Vec<RelocationPlan> {
        groups.iter().map(|group| self.ranker.plan(group)).collect()
    }

    /// Move the quarantinable failures of a scan into the quarantine folder
    pub fn quarantine_failures(
        &self,
        failures: &[FingerprintFailure],
        destination: &Path,
    ) -> Result<RelocationReport> {
        self.quarantine_failures_with_events(failures, destination, &null_sender())
    }

    pub fn quarantine_failures_with_events(
        &self,
        failures: &[FingerprintFailure],
        destination: &Path,
        events: &EventSender,
    ) -> Result<RelocationReport> {
        let mut report = RelocationReport::default();
        for failure in failures
            .iter()
            .filter(|f| f.disposition == FailureDisposition::Quarantine)
        {
            report.merge(self.executor.quarantine_with_events(
                &failure.record.path,
                destination,
                &failure.message,
                events,
            )?);
        }
        Ok(report)
    }

    /// Keep the canonical member of every group and move the rest
    pub fn resolve(&self, groups: &[DuplicateGroup], destination: &Path) -> Result<RelocationReport> {
        self.resolve_with_events(groups, destination, &null_sender())
    }

    pub fn resolve_with_events(
        &self,
        groups: &[DuplicateGroup],
        destination: &Path,
        events: &EventSender,
    ) -> Result<RelocationReport> {
        phase(events, EnginePhase::Relocating);
        events.send(Event::Relocate(RelocateEvent::Started {
            total_moves: groups.iter().map(DuplicateGroup::duplicate_count).sum(),
        }));

        let mut report = RelocationReport::default();
        for plan in self.plan(groups) {
            let result = self.executor.relocate_with_events(&plan, destination, events);
            match result {
                Ok(group_report) => report.merge(group_report),
                Err(error) => {
                    events.send(Event::Engine(EngineEvent::Error {
                        message: error.to_string(),
                    }));
                    return Err(error);
                }
            }
        }

        info!(
            relocated = report.relocated.len(),
            quarantined = report.quarantined.len(),
            errors = report.errors.len(),
            "relocation complete"
        );
        events.send(Event::Relocate(RelocateEvent::Completed {
            relocated: report.relocated.len(),
            quarantined: report.quarantined.len(),
            errors: report.errors.len(),
        }));

        Ok(report)
    }

    /// Restore every logged move after `confirm` agrees
    pub fn undo<F>(&self, confirm: F) -> Result<UndoOutcome>
    where
        F: FnOnce(usize) -> bool,
    {
        self.undo_with_events(confirm, &null_sender())
    }

    pub fn undo_with_events<F>(&self, confirm: F, events: &EventSender) -> Result<UndoOutcome>
    where
        F: FnOnce(usize) -> bool,
    {
        phase(events, EnginePhase::Undoing);
        Undo::new(&self.operations, &self.errors, self.executor.mover()).run_with_events(confirm, events)
    }
}

fn phase(events: &EventSender, phase: EnginePhase) {
    events.send(Event::Engine(EngineEvent::PhaseChanged { phase }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DoppelError;
    use crate::events::{EventChannel, ScanEvent};
    use std::fs;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> Engine {
        Engine::builder()
            .log_dir(dir.path().join("logs"))
            .build()
            .unwrap()
    }

    #[test]
    fn build_creates_log_directory() {
        let dir = TempDir::new().unwrap();
        engine(&dir);
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn build_fails_when_log_directory_is_unusable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();

        let result = Engine::builder().log_dir(blocker.join("logs")).build();
        assert!(matches!(result, Err(DoppelError::Log(_))));
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = engine(&dir).scan_and_group(
            &dir.path().join("missing"),
            MediaCategory::Audio,
            ["mp3"],
        );
        assert!(matches!(result, Err(DoppelError::Scan(_))));
    }

    #[test]
    fn empty_files_are_skipped_not_quarantined() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("docs");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("empty.pdf"), b"").unwrap();
        fs::write(root.join("a.pdf"), b"x").unwrap();

        let engine = engine(&dir);
        let outcome = engine
            .scan_and_group(&root, MediaCategory::Document, ["pdf"])
            .unwrap();

        assert_eq!(outcome.total_files, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].disposition, FailureDisposition::Skip);
        assert_eq!(outcome.quarantinable().count(), 0);
        assert_eq!(outcome.failures[0].message, "file is empty");
        assert_eq!(
            engine.error_log().lines().unwrap(),
            vec![format!("{}: file is empty", root.join("empty.pdf").display())]
        );
    }

    #[test]
    fn events_cover_every_phase() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("music");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.mp3"), b"same").unwrap();
        fs::write(root.join("b.mp3"), b"same").unwrap();

        let engine = engine(&dir);
        let (sender, receiver) = EventChannel::new();
        let outcome = engine
            .scan_and_group_with_events(&root, MediaCategory::Audio, ["mp3"], &sender)
            .unwrap();
        engine
            .resolve_with_events(&outcome.groups, &dir.path().join("dups"), &sender)
            .unwrap();
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        let phases: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Engine(EngineEvent::PhaseChanged { phase }) => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                EnginePhase::Scanning,
                EnginePhase::Fingerprinting,
                EnginePhase::Grouping,
                EnginePhase::Relocating
            ]
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Scan(ScanEvent::Completed { total_files: 2 }))));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Relocate(RelocateEvent::Completed { relocated: 1, .. })
        )));
    }

    #[test]
    fn plan_is_side_effect_free() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("music");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.mp3"), b"same").unwrap();
        fs::write(root.join("b.mp3"), b"same").unwrap();

        let engine = engine(&dir);
        let outcome = engine
            .scan_and_group(&root, MediaCategory::Audio, ["mp3"])
            .unwrap();
        let plans = engine.plan(&outcome.groups);

        assert_eq!(plans.len(), 1);
        assert!(plans[0].keep.path.ends_with("a.mp3"));
        assert!(root.join("b.mp3").exists());
        assert!(engine.operation_log().is_empty().unwrap());
    }
}
