use crate::{
    config::{AppConfig, CallPolicy, Language, OutputConfig},
    emit::{self, EmitError},
    record::{SourceEntry, TranslationRecord},
    source::{self, SourceError},
    translate::{TranslateError, Translator},
    util::{retry_with_backoff, with_timeout},
};
use std::path::PathBuf;

const LOG_TARGET: &str = "pipeline";

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to translate `{key}` into {language}")]
    Translate {
        key: String,
        language: Language,
        #[source]
        source: TranslateError,
    },
    #[error(transparent)]
    Emit(#[from] EmitError),
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: OutputConfig,
    pub languages: Vec<Language>,
    pub policy: CallPolicy,
}

impl PipelineConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            input: app.input.clone(),
            output: app.output.clone(),
            languages: app.languages.clone(),
            policy: app.policy.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub modules: Vec<PathBuf>,
}

pub struct Pipeline<Tr> {
    pub translate: Tr,
    pub config: PipelineConfig,
}

impl<Tr> Pipeline<Tr>
where
    Tr: Translator,
{
    /// Reads the CSV, translates every row, then writes one module per language.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let entries = source::read_entries(&self.config.input)?;
        let records = self.translate_all(entries).await?;
        let modules = self.emit_all(&records)?;

        tracing::info!(
            target: LOG_TARGET,
            records = records.len(),
            modules = modules.len(),
            "generation finished"
        );
        Ok(RunSummary {
            records: records.len(),
            modules,
        })
    }

    pub async fn translate_all(
        &self,
        entries: Vec<SourceEntry>,
    ) -> Result<Vec<TranslationRecord>, PipelineError> {
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = translate_entry(
                &self.translate,
                entry,
                &self.config.languages,
                &self.config.policy,
            )
            .await?;
            tracing::info!(
                target: LOG_TARGET,
                key = %record.key,
                english = %record.source_text,
                french = logged_text(&record, Language::French),
                german = logged_text(&record, Language::German),
                russian = logged_text(&record, Language::Russian),
                "row translated"
            );
            records.push(record);
        }
        Ok(records)
    }

    pub fn emit_all(&self, records: &[TranslationRecord]) -> Result<Vec<PathBuf>, PipelineError> {
        let mut written = Vec::with_capacity(self.config.languages.len());
        for lang in &self.config.languages {
            written.push(emit::write_module(&self.config.output, *lang, records)?);
        }
        Ok(written)
    }
}

/// Translates one entry into every selected target language, one request at a time.
pub async fn translate_entry<Tr>(
    translator: &Tr,
    entry: SourceEntry,
    languages: &[Language],
    policy: &CallPolicy,
) -> Result<TranslationRecord, PipelineError>
where
    Tr: Translator + ?Sized,
{
    let targets = Language::TRANSLATION_ORDER
        .into_iter()
        .filter(|lang| languages.contains(lang));

    let mut translated = Vec::new();
    for target in targets {
        let text = entry.text.as_str();
        let result = retry_with_backoff(
            policy,
            || {
                with_timeout(
                    policy,
                    translator.translate(text.to_owned(), Language::SOURCE, target),
                    || TranslateError::Timeout,
                )
            },
            TranslateError::is_retryable,
        )
        .await;

        match result {
            Ok(translation) => translated.push((target, translation.text)),
            Err(source) => {
                tracing::error!(
                    target: LOG_TARGET,
                    key = %entry.key,
                    language = %target,
                    error = %source,
                    "translation failed"
                );
                return Err(PipelineError::Translate {
                    key: entry.key,
                    language: target,
                    source,
                });
            }
        }
    }

    Ok(translated
        .into_iter()
        .fold(TranslationRecord::new(entry), |record, (lang, text)| {
            record.with_translation(lang, text)
        }))
}

fn logged_text(record: &TranslationRecord, lang: Language) -> &str {
    if record.has_translation(lang) {
        record.text(lang)
    } else {
        "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{PhrasebookTranslator, Translation};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every request and fails according to a script.
    #[derive(Default)]
    struct ScriptedTranslator {
        calls: Mutex<Vec<(String, Language)>>,
        failures: Mutex<Vec<(Language, TranslateError)>>,
    }

    impl ScriptedTranslator {
        fn failing(failures: Vec<(Language, TranslateError)>) -> Self {
            Self {
                calls: Mutex::default(),
                failures: Mutex::new(failures),
            }
        }

        fn calls(&self) -> Vec<(String, Language)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl Translator for ScriptedTranslator {
        fn translate(
            &self,
            text: String,
            source: Language,
            target: Language,
        ) -> BoxFuture<'_, Result<Translation, TranslateError>> {
            async move {
                assert_eq!(source, Language::English);
                self.calls.lock().expect("lock").push((text.clone(), target));
                let mut failures = self.failures.lock().expect("lock");
                if let Some(pos) = failures.iter().position(|(lang, _)| *lang == target) {
                    return Err(failures.remove(pos).1);
                }
                Ok(Translation {
                    text: format!("{}:{text}", target.code()),
                    target,
                })
            }
            .boxed()
        }
    }

    struct StalledTranslator;

    impl Translator for StalledTranslator {
        fn translate(
            &self,
            _text: String,
            _source: Language,
            _target: Language,
        ) -> BoxFuture<'_, Result<Translation, TranslateError>> {
            futures::future::pending().boxed()
        }
    }

    fn pipeline<Tr: Translator>(translate: Tr, dir: &std::path::Path, csv: &str) -> Pipeline<Tr> {
        let input = dir.join("data.csv");
        std::fs::write(&input, csv).expect("write csv");
        Pipeline {
            translate,
            config: PipelineConfig {
                input,
                output: OutputConfig::new(dir.join("out"), "js").expect("valid"),
                languages: Language::ALL.to_vec(),
                policy: CallPolicy::default(),
            },
        }
    }

    #[tokio::test]
    async fn french_module_end_to_end() {
        let dir = tempfile::tempdir().expect("temp dir");
        let translator = PhrasebookTranslator::new()
            .with_phrase(Language::French, "Hello", "Bonjour")
            .with_phrase(Language::French, "Goodbye", "Au revoir");
        let pipeline = pipeline(
            translator,
            dir.path(),
            "key,english\nhey,Hello\nbye,Goodbye\n",
        );

        let summary = pipeline.run().await.expect("run succeeds");
        assert_eq!(summary.records, 2);
        assert_eq!(summary.modules.len(), Language::ALL.len());

        let french = std::fs::read_to_string(dir.path().join("out/french.js")).expect("french");
        assert_eq!(
            french,
            "const french = {\n    hey: \"Bonjour\",\n    bye: \"Au revoir\"\n}\n\nexport default french"
        );
        for lang in Language::ALL {
            assert!(dir.path().join(format!("out/{}.js", lang.name())).is_file());
        }
    }

    #[tokio::test]
    async fn records_follow_csv_order_and_skip_bad_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pipeline = pipeline(
            ScriptedTranslator::default(),
            dir.path(),
            "key,english\na,One\nbroken\nb,Two\nc,Three\n",
        );
        let entries = source::read_entries(&pipeline.config.input).expect("csv");
        let records = pipeline.translate_all(entries).await.expect("translated");

        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(records[1].text(Language::Japanese), "ja:Two");
        assert_eq!(records[1].text(Language::English), "Two");
    }

    #[tokio::test]
    async fn one_request_per_target_in_fixed_order() {
        let translator = ScriptedTranslator::default();
        let record = translate_entry(
            &translator,
            SourceEntry::new("hey", "Hello"),
            &Language::ALL,
            &CallPolicy::default(),
        )
        .await
        .expect("translated");

        let targets: Vec<Language> = translator.calls().into_iter().map(|(_, l)| l).collect();
        assert_eq!(targets, Language::TRANSLATION_ORDER.to_vec());
        for lang in Language::TRANSLATION_ORDER {
            assert_eq!(record.text(lang), format!("{}:Hello", lang.code()));
        }
    }

    #[tokio::test]
    async fn only_selected_languages_are_requested() {
        let translator = ScriptedTranslator::default();
        translate_entry(
            &translator,
            SourceEntry::new("hey", "Hello"),
            &[Language::English, Language::Korean, Language::German],
            &CallPolicy::default(),
        )
        .await
        .expect("translated");

        let targets: Vec<Language> = translator.calls().into_iter().map(|(_, l)| l).collect();
        assert_eq!(targets, vec![Language::German, Language::Korean]);
    }

    #[tokio::test]
    async fn failure_aborts_before_any_module_is_written() {
        let dir = tempfile::tempdir().expect("temp dir");
        let translator = ScriptedTranslator::failing(vec![(
            Language::German,
            TranslateError::Rejected("unsupported".into()),
        )]);
        let pipeline = pipeline(translator, dir.path(), "key,english\nhey,Hello\nbye,Bye\n");

        let err = pipeline.run().await.expect_err("must fail");
        match err {
            PipelineError::Translate { key, language, .. } => {
                assert_eq!(key, "hey");
                assert_eq!(language, Language::German);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("out").exists());
        // Nothing after the failing request was attempted.
        assert_eq!(
            pipeline.translate.calls(),
            vec![
                ("Hello".to_owned(), Language::French),
                ("Hello".to_owned(), Language::German),
            ]
        );
    }

    #[tokio::test]
    async fn throttled_request_is_retried_when_allowed() {
        let translator = ScriptedTranslator::failing(vec![(
            Language::French,
            TranslateError::Throttled("slow down".into()),
        )]);
        let policy = CallPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let record = translate_entry(
            &translator,
            SourceEntry::new("hey", "Hello"),
            &[Language::French],
            &policy,
        )
        .await
        .expect("second attempt succeeds");

        assert_eq!(record.text(Language::French), "fr:Hello");
        assert_eq!(translator.calls().len(), 2);
    }

    #[tokio::test]
    async fn throttled_request_fails_with_default_policy() {
        let translator = ScriptedTranslator::failing(vec![(
            Language::French,
            TranslateError::Throttled("slow down".into()),
        )]);
        let err = translate_entry(
            &translator,
            SourceEntry::new("hey", "Hello"),
            &[Language::French],
            &CallPolicy::default(),
        )
        .await
        .expect_err("no retry by default");

        assert!(matches!(
            err,
            PipelineError::Translate {
                source: TranslateError::Throttled(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stalled_request_times_out() {
        let policy = CallPolicy::new(1, Some(Duration::from_millis(10))).expect("valid");
        let err = translate_entry(
            &StalledTranslator,
            SourceEntry::new("hey", "Hello"),
            &[Language::Italian],
            &policy,
        )
        .await
        .expect_err("times out");

        assert!(matches!(
            err,
            PipelineError::Translate {
                source: TranslateError::Timeout,
                language: Language::Italian,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn write_failure_stops_emission_and_keeps_earlier_modules() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("out/french.js")).expect("blocking dir");
        let pipeline = pipeline(
            PhrasebookTranslator::new(),
            dir.path(),
            "key,english\nhey,Hello\n",
        );

        let err = pipeline.run().await.expect_err("write must fail");
        assert!(matches!(err, PipelineError::Emit(EmitError::Write { .. })));

        let out = dir.path().join("out");
        assert!(out.join("english.js").is_file());
        assert!(out.join("russian.js").is_file());
        assert!(!out.join("german.js").exists());
    }

    #[tokio::test]
    async fn missing_input_is_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pipeline = Pipeline {
            translate: PhrasebookTranslator::new(),
            config: PipelineConfig {
                input: dir.path().join("absent.csv"),
                output: OutputConfig::new(dir.path(), "js").expect("valid"),
                languages: Language::ALL.to_vec(),
                policy: CallPolicy::default(),
            },
        };
        assert!(matches!(
            pipeline.run().await,
            Err(PipelineError::Source(_))
        ));
    }
}
