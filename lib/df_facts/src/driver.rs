//! Parallel translation of whole containers.

use crate::class::{ClassWriter, TranslatedClass};
use crate::errors::{FactsError, FactsResult};
use crate::hierarchy::{Cha, HierarchyReporter, PhantomCounts};
use crate::signatures::SignatureCache;
use crate::sink::FactSink;
use df_dex::classes::ClassDef;
use df_dex::{Container, Index};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Translation options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Number of worker threads.
    pub cores: usize,
    /// Number of classes translated in a row by one worker.
    pub group_size: usize,
    /// Stops at the first failing class group instead of skipping failures.
    pub fail_fast: bool,
    /// Classes whose name matches are application classes. Every class when
    /// unset.
    pub app_regex: Option<Regex>,
    /// Only classes whose name matches are translated.
    pub class_filter: Option<Regex>,
    /// Writes phantom types and methods after the run.
    pub phantoms: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cores: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            group_size: 80,
            fail_fast: false,
            app_regex: None,
            class_filter: None,
            phantoms: true,
        }
    }
}

impl Options {
    #[must_use]
    pub fn is_application_class(&self, class: &str) -> bool {
        self.app_regex
            .as_ref()
            .map_or(true, |regex| regex.is_match(class))
    }

    #[must_use]
    pub fn accepts_class(&self, class: &str) -> bool {
        self.class_filter
            .as_ref()
            .map_or(true, |regex| regex.is_match(class))
    }
}

/// Run statistics.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    pub containers: usize,
    pub classes: usize,
    pub methods: usize,
    pub instructions: usize,
    pub failures: usize,
    pub phantoms: PhantomCounts,
}

#[derive(Debug, Default)]
struct Counters {
    classes: AtomicUsize,
    methods: AtomicUsize,
    instructions: AtomicUsize,
    failures: AtomicUsize,
}

impl Counters {
    fn record(&self, class: &TranslatedClass) {
        self.classes.fetch_add(1, Ordering::Relaxed);
        self.methods.fetch_add(class.methods, Ordering::Relaxed);
        self.instructions
            .fetch_add(class.instructions, Ordering::Relaxed);
        self.failures.fetch_add(class.failures, Ordering::Relaxed);
    }
}

/// Translates containers on a thread pool, reporting the class hierarchy to
/// a shared [`Cha`].
pub struct Driver<'a> {
    sink: &'a dyn FactSink,
    options: Options,
    cha: Cha,
}

impl<'a> Driver<'a> {
    #[must_use]
    pub fn new(sink: &'a dyn FactSink, options: Options) -> Self {
        Self {
            sink,
            options,
            cha: Cha::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Translates every container, then writes the hierarchy dependent facts.
    ///
    /// In fail fast mode, containers after the first failing one are not
    /// translated and the run fails.
    pub fn run(&self, containers: &[Container]) -> FactsResult<Stats> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.cores.max(1))
            .build()?;
        let counters = Counters::default();
        let errors = AtomicUsize::new(0);
        let mut translated_containers = 0;

        for container in containers {
            if self.options.fail_fast && errors.load(Ordering::SeqCst) > 0 {
                warn!("skipping container '{}' after errors", container.name());
                continue;
            }
            info!(
                "translating container '{}' ({} classes)",
                container.name(),
                container.classes().len()
            );
            pool.install(|| self.translate_container(container, &counters, &errors));
            translated_containers += 1;
        }

        let phantoms = self.cha.conclude(self.sink, self.options.phantoms);
        let stats = Stats {
            containers: translated_containers,
            classes: counters.classes.into_inner(),
            methods: counters.methods.into_inner(),
            instructions: counters.instructions.into_inner(),
            failures: counters.failures.into_inner(),
            phantoms,
        };
        info!(
            "{} classes, {} methods, {} instructions translated",
            stats.classes, stats.methods, stats.instructions
        );

        let errors = errors.into_inner();
        if errors > 0 {
            return Err(FactsError::Failed { errors });
        }
        if stats.failures > 0 {
            warn!("{} failures skipped", stats.failures);
        }
        Ok(stats)
    }

    fn translate_container(
        &self,
        container: &Container,
        counters: &Counters,
        errors: &AtomicUsize,
    ) {
        let sigs = SignatureCache::new();
        let classes: Vec<&ClassDef> = container
            .classes()
            .iter()
            .filter(|class| self.options.accepts_class(&class.name()))
            .collect();

        classes
            .par_chunks(self.options.group_size.max(1))
            .for_each(|group| {
                if let Err(err) = self.translate_group(container, &sigs, group, counters) {
                    error!("{err}");
                    errors.fetch_add(1, Ordering::SeqCst);
                }
            });

        self.report_references(container, &sigs);
        debug!("{} signatures cached", sigs.len());
    }

    /// Translates the classes of a group in order. In fail fast mode, stops
    /// at the first failing class; otherwise the class is logged, counted as
    /// a failure and the group goes on.
    fn translate_group(
        &self,
        container: &Container,
        sigs: &SignatureCache,
        group: &[&ClassDef],
        counters: &Counters,
    ) -> FactsResult<()> {
        for class in group {
            let result = ClassWriter::new(container, self.sink, sigs, &self.options, class)
                .write()
                .and_then(|translated| {
                    counters.record(&translated);
                    self.report_class(translated)
                });
            match result {
                Ok(()) => (),
                Err(err) if self.options.fail_fast => return Err(err),
                Err(err) => {
                    error!("class {} skipped: {err}", class.name());
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        Ok(())
    }

    fn report_class(&self, class: TranslatedClass) -> FactsResult<()> {
        self.cha.register_defined_methods(class.defined_methods);
        self.cha.queue_field_ops(class.field_ops);
        if let Some(super_class) = &class.super_class {
            self.cha.register_super_class(&class.name, super_class)?;
        }
        self.cha
            .register_defined_class_fields(&class.name, class.defined_fields);
        Ok(())
    }

    /// Reports every reference of the container tables.
    fn report_references(&self, container: &Container, sigs: &SignatureCache) {
        for (i, _) in container.fields().iter().enumerate() {
            match sigs.field(container, Index::new(i)) {
                Ok(field) => self.cha.register_referenced_field(field),
                Err(err) => error!("{err}"),
            }
        }
        for type_ in container.types() {
            self.cha.register_referenced_type(type_);
        }
        for (i, _) in container.methods().iter().enumerate() {
            match sigs.method(container, Index::new(i)) {
                Ok(method) => self.cha.register_referenced_method(method.id().to_string()),
                Err(err) => error!("{err}"),
            }
        }

        let handles = container.method_handles().len();
        if handles > 0 {
            warn!(
                "container '{}' has {handles} method handles, not translated",
                container.name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::Relation;
    use crate::sink::MemorySink;

    const CONTAINER: &str = r#"{
        "name": "classes.dex",
        "types": ["La/Child;", "La/Parent;", "Lx/Lib;", "[I"],
        "fields": [
            {"class": "La/Parent;", "name": "count", "type": "I"},
            {"class": "La/Child;", "name": "count", "type": "I"}
        ],
        "methods": [
            {"class": "La/Child;", "name": "read", "params": [], "return": "I"},
            {"class": "Lx/Lib;", "name": "call", "params": [], "return": "V"},
            {"class": "La/Parent;", "name": "broken", "params": [], "return": "V"}
        ],
        "classes": [
            {
                "class": "La/Parent;",
                "superclass": "Ljava/lang/Object;",
                "access_flags": 1,
                "fields": [{"field": 0, "access_flags": 1}],
                "methods": [{"method": 2, "access_flags": 9, "code": {"registers_size": 1, "instructions": [{"op": "unknown", "args": [62, 1]}]}}]
            },
            {
                "class": "La/Child;",
                "superclass": "La/Parent;",
                "access_flags": 1,
                "methods": [{
                    "method": 0,
                    "access_flags": 1,
                    "code": {"registers_size": 2, "instructions": [
                        {"op": "iget", "args": [0, 1, 1]},
                        {"op": "invoke-static", "args": [[], 1]},
                        {"op": "return", "args": 0}
                    ]}
                }]
            }
        ]
    }"#;

    fn options(cores: usize, group_size: usize) -> Options {
        Options {
            cores,
            group_size,
            ..Options::default()
        }
    }

    #[test]
    fn tolerant_run() {
        let container = Container::from_json(CONTAINER).unwrap();
        let sink = MemorySink::new();
        let driver = Driver::new(&sink, options(2, 1));
        let stats = driver.run(&[container]).unwrap();

        assert_eq!(stats.containers, 1);
        assert_eq!(stats.classes, 2);
        assert_eq!(stats.methods, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.instructions, 3);
        assert_eq!(stats.phantoms.types, 1);
        assert_eq!(stats.phantoms.methods, 2);
        assert_eq!(stats.phantoms.fields, 0);

        let child = "<a.Child: int read()>";
        assert_eq!(
            sink.rows(Relation::LoadInstanceField),
            vec![vec![
                format!("{child}/read-field-count/0"),
                "1".to_string(),
                format!("{child}/v0"),
                format!("{child}/p0"),
                "<a.Parent: int count>".to_string(),
                child.to_string(),
            ]]
        );
        assert_eq!(sink.rows(Relation::PhantomType), vec![vec!["x.Lib"]]);
        assert_eq!(
            sink.rows(Relation::PhantomMethod),
            vec![vec!["<a.Parent: void broken()>"], vec!["<x.Lib: void call()>"]]
        );
    }

    #[test]
    fn fail_fast_run() {
        let containers = vec![
            Container::from_json(CONTAINER).unwrap(),
            Container::from_json(CONTAINER).unwrap(),
        ];
        let sink = MemorySink::new();
        let mut options = options(1, 80);
        options.fail_fast = true;
        let driver = Driver::new(&sink, options);
        assert!(matches!(
            driver.run(&containers),
            Err(FactsError::Failed { errors: 1 })
        ));
    }

    #[test]
    fn failing_class_does_not_stop_its_group() {
        let container = Container::from_json(
            r#"{
                "fields": [{"class": "La/Good;", "name": "ok", "type": "I"}],
                "classes": [
                    {"class": "La/Dup;", "superclass": "Ljava/lang/Object;", "access_flags": 1},
                    {"class": "La/Dup;", "superclass": "La/Good;", "access_flags": 1},
                    {"class": "La/Bad;", "superclass": "Ljava/lang/Object;", "access_flags": 1, "fields": [{"field": 7, "access_flags": 1}]},
                    {"class": "La/Good;", "superclass": "Ljava/lang/Object;", "access_flags": 1, "fields": [{"field": 0, "access_flags": 1}]}
                ]
            }"#,
        )
        .unwrap();
        let sink = MemorySink::new();
        let stats = Driver::new(&sink, options(1, 80)).run(&[container]).unwrap();

        // conflicting super class of the second a.Dup, missing field of a.Bad
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.classes, 4);
        assert_eq!(
            sink.rows(Relation::ClassType),
            vec![vec!["a.Dup"], vec!["a.Dup"], vec!["a.Bad"], vec!["a.Good"]]
        );
        assert_eq!(
            sink.rows(Relation::Field),
            vec![vec!["<a.Good: int ok>", "a.Good", "ok", "int"]]
        );
    }

    #[test]
    fn class_filter() {
        let container = Container::from_json(CONTAINER).unwrap();
        let sink = MemorySink::new();
        let mut options = options(1, 80);
        options.class_filter = Some(Regex::new("Child$").unwrap());
        options.phantoms = false;
        let stats = Driver::new(&sink, options).run(&[container]).unwrap();
        assert_eq!(stats.classes, 1);
        assert_eq!(stats.failures, 0);
        assert_eq!(sink.count(Relation::PhantomType), 0);
        assert_eq!(sink.rows(Relation::ClassType), vec![vec!["a.Child"]]);
    }

    #[test]
    fn options_defaults() {
        let options = Options::default();
        assert!(options.cores >= 1);
        assert_eq!(options.group_size, 80);
        assert!(options.is_application_class("any.Class"));
        assert!(options.accepts_class("any.Class"));
    }
}
