//! Proxy execution protocol
//!
//! One run moves linearly through `before hooks → base command → after hooks`.
//! Hooks whose process cannot be started abort the run; a hook or base command
//! that starts and exits non-zero does not. Everything runs sequentially and
//! blocks on each child process.

use crate::conditions::unmet_condition;
use crate::environment::compose_environment;
use crate::executor::{CommandOutcome, CommandRunner, Invocation, ProcessRunner};
use proxybuild_config::{Config, Hook, HookPhase};
use proxybuild_core::platform::CURRENT_PLATFORM;
use proxybuild_core::{EnvironmentSource, Error, ProcessEnvironment, Result};
use std::io;

/// Exit code reported when the base command could not be started
pub const NOT_STARTED_EXIT_CODE: i32 = 127;

/// Hook execution stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// Before the base command
    Before,
    /// After the base command
    After,
}

impl HookStage {
    /// Get the string name of this hook stage
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            HookStage::Before => "before",
            HookStage::After => "after",
        }
    }

    /// Whether a hook declared with `phase` belongs to this stage
    #[must_use]
    pub fn matches(&self, phase: &HookPhase) -> bool {
        matches!(
            (self, phase),
            (HookStage::Before, HookPhase::Before) | (HookStage::After, HookPhase::After)
        )
    }
}

/// What happened to the base command
#[derive(Debug)]
pub enum BaseOutcome {
    /// The base command ran to completion
    Exited(CommandOutcome),
    /// The base command could not be started
    NotStarted(Error),
}

impl BaseOutcome {
    /// Whether the base command failed or could not be started
    #[must_use]
    pub fn had_error(&self) -> bool {
        match self {
            BaseOutcome::Exited(outcome) => !outcome.success,
            BaseOutcome::NotStarted(_) => true,
        }
    }
}

/// Result of a completed run
///
/// A run that reaches the end is reported here even if the base command
/// failed; only a hook that could not be started turns the run into an error.
#[derive(Debug)]
pub struct RunReport {
    /// Sub-command the hooks were selected by (empty without arguments)
    pub sub_command: String,
    /// Number of before-hooks that fired
    pub before_hooks_run: usize,
    /// Number of after-hooks that fired
    pub after_hooks_run: usize,
    /// Outcome of the base command
    pub base: BaseOutcome,
}

impl RunReport {
    /// Whether the base command failed or could not be started
    #[must_use]
    pub fn had_error(&self) -> bool {
        self.base.had_error()
    }

    /// Exit code a wrapper process should terminate with
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match &self.base {
            BaseOutcome::Exited(outcome) => outcome.exit_code(),
            BaseOutcome::NotStarted(_) => NOT_STARTED_EXIT_CODE,
        }
    }
}

/// Runs a configuration against invocation arguments
pub struct ProxyRunner<'a, R = ProcessRunner, E = ProcessEnvironment>
where
    R: CommandRunner,
    E: EnvironmentSource,
{
    config: &'a Config,
    runner: R,
    environment: E,
    platform: &'a str,
}

impl<'a> ProxyRunner<'a> {
    /// Create a runner that spawns real processes on the current platform
    ///
    /// For custom configuration, use [`ProxyRunner::builder`].
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self::builder(config).build()
    }

    /// Create a builder for configuring a `ProxyRunner`
    ///
    /// # Examples
    ///
    /// ```
    /// use indexmap::IndexMap;
    /// use proxybuild_config::Config;
    /// use proxybuild_engine::ProxyRunner;
    /// use std::ffi::OsString;
    ///
    /// let config = Config::default();
    /// let runner = ProxyRunner::builder(&config)
    ///     .environment(IndexMap::<OsString, OsString>::new)
    ///     .platform("linux")
    ///     .build();
    /// assert_eq!(runner.platform(), "linux");
    /// ```
    #[must_use]
    pub fn builder(config: &'a Config) -> ProxyRunnerBuilder<'a> {
        ProxyRunnerBuilder::new(config)
    }
}

impl<R, E> ProxyRunner<'_, R, E>
where
    R: CommandRunner,
    E: EnvironmentSource,
{
    /// Platform identifier hooks are matched against
    #[must_use]
    pub fn platform(&self) -> &str {
        self.platform
    }

    /// Run before-hooks, the base command and after-hooks
    ///
    /// The first argument selects the sub-command whose hooks apply; all
    /// arguments are passed to the base command and to condition evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HookAborted`] if a hook could not be started. Remaining
    /// hooks (and, for a before-hook, the base command) do not run.
    #[tracing::instrument(
        skip(self, args),
        fields(base_command = %self.config.base_command, sub_command = tracing::field::Empty)
    )]
    pub fn run(&self, args: &[String]) -> Result<RunReport> {
        let sub_command = args.first().map_or("", String::as_str);
        tracing::Span::current().record("sub_command", sub_command);

        let hooks = self.config.hooks_for(sub_command);
        tracing::debug!(hooks = hooks.len(), "Resolved hooks for sub-command");

        let before_hooks_run = self.run_stage(HookStage::Before, sub_command, hooks, args, false)?;

        let base = self.run_base(args)?;
        let after_hooks_run =
            self.run_stage(HookStage::After, sub_command, hooks, args, base.had_error())?;

        Ok(RunReport {
            sub_command: sub_command.to_string(),
            before_hooks_run,
            after_hooks_run,
            base,
        })
    }

    /// Run the base command with the composed environment
    fn run_base(&self, args: &[String]) -> Result<BaseOutcome> {
        if self.config.base_command.is_empty() {
            tracing::warn!("No base command configured");
            return Ok(BaseOutcome::NotStarted(Error::Startup {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::NotFound, "no base command configured"),
            }));
        }

        let env = compose_environment(&self.config.env_vars, self.environment.snapshot());
        let invocation =
            Invocation::new(&self.config.base_command, args, self.config.executor).with_env(&env);

        match self.runner.run(&invocation) {
            Ok(outcome) => {
                if !outcome.success {
                    tracing::debug!(code = ?outcome.code, "Base command failed");
                }
                Ok(BaseOutcome::Exited(outcome))
            }
            Err(e) if e.is_startup_error() => {
                tracing::warn!(error = %e, "Base command could not be started");
                Ok(BaseOutcome::NotStarted(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Run the hooks of one stage in declaration order
    ///
    /// Returns how many hooks fired.
    #[tracing::instrument(skip(self, hooks, args), fields(stage = %stage.name()))]
    fn run_stage(
        &self,
        stage: HookStage,
        sub_command: &str,
        hooks: &[Hook],
        args: &[String],
        had_error: bool,
    ) -> Result<usize> {
        let mut fired = 0;

        for (position, hook) in hooks.iter().enumerate() {
            if !stage.matches(&hook.when) {
                if stage == HookStage::Before
                    && matches!(hook.when, HookPhase::Unrecognized | HookPhase::Other(_))
                {
                    tracing::warn!(
                        position,
                        command = %hook.command,
                        when = %hook.when,
                        "Hook phase is neither 'before' nor 'after'; it never fires"
                    );
                }
                continue;
            }

            if let Some(unmet) = unmet_condition(&hook.conditions, args, had_error, self.platform) {
                tracing::debug!(position, command = %hook.command, reason = %unmet, "Skipping hook");
                continue;
            }

            tracing::debug!(position, command = %hook.command, "Running hook");

            // Hooks never receive the composed environment
            let invocation = Invocation::new(&hook.command, &hook.args, hook.executor);
            let outcome = self
                .runner
                .run(&invocation)
                .map_err(|source| Error::HookAborted {
                    phase: stage.name(),
                    sub_command: sub_command.to_string(),
                    position,
                    command: hook.command.clone(),
                    source: Box::new(source),
                })?;
            fired += 1;

            if !outcome.success {
                tracing::warn!(
                    position,
                    command = %hook.command,
                    code = ?outcome.code,
                    "Hook exited with failure; continuing"
                );
            }
        }

        Ok(fired)
    }
}

/// Builder for creating a `ProxyRunner` with custom collaborators
pub struct ProxyRunnerBuilder<'a, R = ProcessRunner, E = ProcessEnvironment>
where
    R: CommandRunner,
    E: EnvironmentSource,
{
    config: &'a Config,
    runner: R,
    environment: E,
    platform: &'a str,
}

impl<'a> ProxyRunnerBuilder<'a> {
    /// Create a new builder with real processes and the real environment
    ///
    /// This is typically called via [`ProxyRunner::builder`].
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            runner: ProcessRunner,
            environment: ProcessEnvironment,
            platform: CURRENT_PLATFORM.os,
        }
    }
}

impl<'a, R, E> ProxyRunnerBuilder<'a, R, E>
where
    R: CommandRunner,
    E: EnvironmentSource,
{
    /// Set the backend that launches commands
    pub fn runner<T>(self, runner: T) -> ProxyRunnerBuilder<'a, T, E>
    where
        T: CommandRunner,
    {
        ProxyRunnerBuilder {
            config: self.config,
            runner,
            environment: self.environment,
            platform: self.platform,
        }
    }

    /// Set the source of the ambient environment
    pub fn environment<T>(self, environment: T) -> ProxyRunnerBuilder<'a, R, T>
    where
        T: EnvironmentSource,
    {
        ProxyRunnerBuilder {
            config: self.config,
            runner: self.runner,
            environment,
            platform: self.platform,
        }
    }

    /// Override the platform identifier used for `os_match`
    #[must_use]
    pub fn platform(mut self, platform: &'a str) -> Self {
        self.platform = platform;
        self
    }

    /// Build the runner
    pub fn build(self) -> ProxyRunner<'a, R, E> {
        ProxyRunner {
            config: self.config,
            runner: self.runner,
            environment: self.environment,
            platform: self.platform,
        }
    }
}

/// Run a configuration with real processes on the current platform
///
/// # Errors
///
/// Returns [`Error::HookAborted`] if a hook could not be started
pub fn run(config: &Config, args: &[String]) -> Result<RunReport> {
    ProxyRunner::new(config).run(args)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use indexmap::IndexMap;
    use proxybuild_config::{Conditions, ErrorCondition, ExecutorKind};
    use std::cell::RefCell;
    use std::ffi::{OsStr, OsString};

    /// One recorded launch
    #[derive(Debug, Clone)]
    struct Call {
        command: String,
        args: Vec<String>,
        executor: ExecutorKind,
        env: Option<IndexMap<OsString, OsString>>,
    }

    /// Records every launch; commands can be scripted to fail or be missing
    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<Call>>,
        failing: Vec<&'static str>,
        missing: Vec<&'static str>,
    }

    impl RecordingRunner {
        fn commands(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.command.clone()).collect()
        }

        fn call(&self, command: &str) -> Call {
            self.calls
                .borrow()
                .iter()
                .find(|c| c.command == command)
                .cloned()
                .unwrap()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation<'_>) -> Result<CommandOutcome> {
            if self.missing.iter().any(|m| *m == invocation.command) {
                return Err(Error::Startup {
                    program: invocation.command.to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "not found"),
                });
            }

            self.calls.borrow_mut().push(Call {
                command: invocation.command.to_string(),
                args: invocation.args.to_vec(),
                executor: invocation.executor,
                env: invocation.env.cloned(),
            });

            if self.failing.iter().any(|m| *m == invocation.command) {
                Ok(CommandOutcome::exited(1))
            } else {
                Ok(CommandOutcome::succeeded())
            }
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn no_env() -> IndexMap<OsString, OsString> {
        IndexMap::new()
    }

    fn config(hooks: &[(&str, Vec<Hook>)]) -> Config {
        Config {
            base_command: "base".to_string(),
            hooks: hooks
                .iter()
                .map(|(name, list)| ((*name).to_string(), list.clone()))
                .collect(),
            ..Config::default()
        }
    }

    fn run_with(config: &Config, recorder: &RecordingRunner, argv: &[&str]) -> Result<RunReport> {
        ProxyRunner::builder(config)
            .runner(recorder)
            .environment(no_env)
            .platform("linux")
            .build()
            .run(&args(argv))
    }

    #[test]
    fn test_hook_stage_name() {
        assert_eq!(HookStage::Before.name(), "before");
        assert_eq!(HookStage::After.name(), "after");
    }

    #[test]
    fn test_hook_stage_matches() {
        assert!(HookStage::Before.matches(&HookPhase::Before));
        assert!(HookStage::After.matches(&HookPhase::After));
        assert!(!HookStage::Before.matches(&HookPhase::After));
        assert!(!HookStage::After.matches(&HookPhase::Other("during".to_string())));
        assert!(!HookStage::Before.matches(&HookPhase::Unrecognized));
    }

    #[test]
    fn test_phases_run_in_declaration_order() {
        let config = config(&[(
            "up",
            vec![
                Hook::new("after-1", HookPhase::After),
                Hook::new("before-1", HookPhase::Before),
                Hook::new("before-2", HookPhase::Before),
                Hook::new("after-2", HookPhase::After),
                Hook::new("before-3", HookPhase::Before),
            ],
        )]);
        let recorder = RecordingRunner::default();

        let report = run_with(&config, &recorder, &["up", "-d"]).unwrap();

        assert_eq!(
            recorder.commands(),
            ["before-1", "before-2", "before-3", "base", "after-1", "after-2"]
        );
        assert_eq!(report.sub_command, "up");
        assert_eq!(report.before_hooks_run, 3);
        assert_eq!(report.after_hooks_run, 2);
        assert!(!report.had_error());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_base_receives_all_arguments_and_executor() {
        let mut config = config(&[]);
        config.executor = ExecutorKind::Direct;
        let recorder = RecordingRunner::default();

        run_with(&config, &recorder, &["logs", "-f", "web"]).unwrap();

        let base = recorder.call("base");
        assert_eq!(base.args, ["logs", "-f", "web"]);
        assert_eq!(base.executor, ExecutorKind::Direct);
    }

    #[test]
    fn test_hooks_use_their_own_executor_and_args() {
        let config = config(&[(
            "up",
            vec![
                Hook::new("notify", HookPhase::Before)
                    .with_args(["starting"])
                    .with_executor(ExecutorKind::Direct),
            ],
        )]);
        let recorder = RecordingRunner::default();

        run_with(&config, &recorder, &["up"]).unwrap();

        let hook = recorder.call("notify");
        assert_eq!(hook.args, ["starting"]);
        assert_eq!(hook.executor, ExecutorKind::Direct);
    }

    #[test]
    fn test_before_hooks_see_no_error() {
        let on_error = |phase: HookPhase, name: &str| {
            Hook::new(name, phase).with_conditions(Conditions {
                on_error: ErrorCondition::RequireError,
                ..Conditions::default()
            })
        };
        let config = config(&[(
            "up",
            vec![
                on_error(HookPhase::Before, "before-on-error"),
                on_error(HookPhase::After, "after-on-error"),
            ],
        )]);
        let recorder = RecordingRunner {
            failing: vec!["base"],
            ..RecordingRunner::default()
        };

        let report = run_with(&config, &recorder, &["up"]).unwrap();

        assert_eq!(recorder.commands(), ["base", "after-on-error"]);
        assert!(report.had_error());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_after_hooks_see_base_outcome() {
        let on_success = Hook::new("cleanup", HookPhase::After).with_conditions(Conditions {
            on_error: ErrorCondition::RequireSuccess,
            ..Conditions::default()
        });
        let config = config(&[("down", vec![on_success])]);

        let recorder = RecordingRunner::default();
        run_with(&config, &recorder, &["down"]).unwrap();
        assert_eq!(recorder.commands(), ["base", "cleanup"]);

        let recorder = RecordingRunner {
            failing: vec!["base"],
            ..RecordingRunner::default()
        };
        run_with(&config, &recorder, &["down"]).unwrap();
        assert_eq!(recorder.commands(), ["base"]);
    }

    #[test]
    fn test_composed_environment_goes_to_base_only() {
        let mut config = config(&[(
            "up",
            vec![
                Hook::new("before", HookPhase::Before),
                Hook::new("after", HookPhase::After),
            ],
        )]);
        config.env_vars.insert("SHARED".to_string(), "config".to_string());
        config.env_vars.insert("CONFIG_ONLY".to_string(), "1".to_string());

        let ambient = || {
            IndexMap::from([
                (OsString::from("SHARED"), OsString::from("ambient")),
                (OsString::from("HOME"), OsString::from("/home/test")),
            ])
        };
        let recorder = RecordingRunner::default();
        ProxyRunner::builder(&config)
            .runner(&recorder)
            .environment(ambient)
            .platform("linux")
            .build()
            .run(&args(&["up"]))
            .unwrap();

        let env = recorder.call("base").env.unwrap();
        assert_eq!(env[OsStr::new("SHARED")], "ambient");
        assert_eq!(env[OsStr::new("CONFIG_ONLY")], "1");
        assert_eq!(env[OsStr::new("HOME")], "/home/test");

        assert!(recorder.call("before").env.is_none());
        assert!(recorder.call("after").env.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_ambient_variable_reaches_base() {
        use std::os::unix::ffi::OsStrExt;

        let mut config = config(&[]);
        config.env_vars.insert("CONFIG_ONLY".to_string(), "1".to_string());

        let ambient = || {
            IndexMap::from([(
                OsString::from("RAW_VAR"),
                OsStr::from_bytes(b"caf\xe9").to_os_string(),
            )])
        };
        let recorder = RecordingRunner::default();
        ProxyRunner::builder(&config)
            .runner(&recorder)
            .environment(ambient)
            .platform("linux")
            .build()
            .run(&[])
            .unwrap();

        let env = recorder.call("base").env.unwrap();
        assert_eq!(env[OsStr::new("RAW_VAR")].as_bytes(), b"caf\xe9");
        assert_eq!(env[OsStr::new("CONFIG_ONLY")], "1");
    }

    #[test]
    fn test_before_hook_start_failure_aborts_run() {
        let config = config(&[(
            "up",
            vec![
                Hook::new("first", HookPhase::Before),
                Hook::new("missing", HookPhase::Before),
                Hook::new("never", HookPhase::Before),
                Hook::new("after", HookPhase::After),
            ],
        )]);
        let recorder = RecordingRunner {
            missing: vec!["missing"],
            ..RecordingRunner::default()
        };

        let err = run_with(&config, &recorder, &["up"]).unwrap_err();

        assert_eq!(recorder.commands(), ["first"]);
        assert!(err.is_startup_error());
        match err {
            Error::HookAborted {
                phase,
                sub_command,
                position,
                command,
                ..
            } => {
                assert_eq!(phase, "before");
                assert_eq!(sub_command, "up");
                assert_eq!(position, 1);
                assert_eq!(command, "missing");
            }
            other => panic!("expected HookAborted, got {other:?}"),
        }
    }

    #[test]
    fn test_after_hook_start_failure_aborts_remaining() {
        let config = config(&[(
            "up",
            vec![
                Hook::new("missing", HookPhase::After),
                Hook::new("never", HookPhase::After),
            ],
        )]);
        let recorder = RecordingRunner {
            missing: vec!["missing"],
            ..RecordingRunner::default()
        };

        let err = run_with(&config, &recorder, &["up"]).unwrap_err();

        assert_eq!(recorder.commands(), ["base"]);
        assert!(matches!(err, Error::HookAborted { phase: "after", .. }));
    }

    #[test]
    fn test_hook_non_zero_exit_does_not_abort() {
        let config = config(&[(
            "up",
            vec![
                Hook::new("flaky", HookPhase::Before),
                Hook::new("next", HookPhase::Before),
            ],
        )]);
        let recorder = RecordingRunner {
            failing: vec!["flaky"],
            ..RecordingRunner::default()
        };

        let report = run_with(&config, &recorder, &["up"]).unwrap();

        assert_eq!(recorder.commands(), ["flaky", "next", "base"]);
        assert_eq!(report.before_hooks_run, 2);
        assert!(!report.had_error());
    }

    #[test]
    fn test_base_start_failure_is_reported() {
        let on_error = Hook::new("report", HookPhase::After).with_conditions(Conditions {
            on_error: ErrorCondition::RequireError,
            ..Conditions::default()
        });
        let config = config(&[("up", vec![on_error])]);
        let recorder = RecordingRunner {
            missing: vec!["base"],
            ..RecordingRunner::default()
        };

        let report = run_with(&config, &recorder, &["up"]).unwrap();

        assert!(matches!(report.base, BaseOutcome::NotStarted(_)));
        assert!(report.had_error());
        assert_eq!(report.exit_code(), NOT_STARTED_EXIT_CODE);
        assert_eq!(recorder.commands(), ["report"]);
    }

    #[test]
    fn test_empty_base_command_is_not_started() {
        let config = Config::default();
        let recorder = RecordingRunner::default();

        let report = run_with(&config, &recorder, &[]).unwrap();

        assert!(recorder.commands().is_empty());
        assert_eq!(report.exit_code(), NOT_STARTED_EXIT_CODE);
    }

    #[test]
    fn test_empty_arguments_select_empty_key() {
        let config = config(&[
            ("", vec![Hook::new("bare", HookPhase::Before)]),
            ("up", vec![Hook::new("up-hook", HookPhase::Before)]),
        ]);

        let recorder = RecordingRunner::default();
        let report = run_with(&config, &recorder, &[]).unwrap();
        assert_eq!(report.sub_command, "");
        assert_eq!(recorder.commands(), ["bare", "base"]);

        let recorder = RecordingRunner::default();
        run_with(&config, &recorder, &["up"]).unwrap();
        assert_eq!(recorder.commands(), ["up-hook", "base"]);
    }

    #[test]
    fn test_unknown_sub_command_runs_base_only() {
        let config = config(&[("up", vec![Hook::new("up-hook", HookPhase::Before)])]);
        let recorder = RecordingRunner::default();

        let report = run_with(&config, &recorder, &["ps"]).unwrap();

        assert_eq!(recorder.commands(), ["base"]);
        assert_eq!(report.before_hooks_run + report.after_hooks_run, 0);
    }

    #[test]
    fn test_platform_filters_hooks() {
        let config = config(&[(
            "up",
            vec![Hook::new("mac-only", HookPhase::Before).with_conditions(Conditions {
                os_match: args(&["darwin"]),
                ..Conditions::default()
            })],
        )]);

        let recorder = RecordingRunner::default();
        run_with(&config, &recorder, &["up"]).unwrap();
        assert_eq!(recorder.commands(), ["base"]);

        let recorder = RecordingRunner::default();
        ProxyRunner::builder(&config)
            .runner(&recorder)
            .environment(no_env)
            .platform("darwin")
            .build()
            .run(&args(&["up"]))
            .unwrap();
        assert_eq!(recorder.commands(), ["mac-only", "base"]);
    }

    #[test]
    fn test_unrecognized_phase_never_fires() {
        let config = config(&[(
            "up",
            vec![
                Hook::new("during", HookPhase::Other("during".to_string())),
                Hook::new("unset", HookPhase::Unrecognized),
            ],
        )]);
        let recorder = RecordingRunner::default();

        run_with(&config, &recorder, &["up"]).unwrap();

        assert_eq!(recorder.commands(), ["base"]);
    }

    #[test]
    fn test_default_builder_uses_current_platform() {
        let config = Config::default();
        let runner = ProxyRunner::new(&config);
        assert_eq!(runner.platform(), CURRENT_PLATFORM.os);
    }
}
