//! Lifecycle of one external-solver call: write the problem to a scratch
//! file, spawn the solver with stdout redirected to a companion `.out` file,
//! wait under the deadline, tear the child down on expiry or termination,
//! parse whatever output exists and clean up.

pub(crate) mod parse;
pub(crate) mod write;

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use log::debug;
use log::info;
use log::warn;
use nix::sys::signal::kill;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::basic_types::Assignment;
use crate::basic_types::Lit;
use crate::driver::parse::parse_output;
use crate::driver::parse::ParsedOutput;
use crate::encoding::ClauseStore;
use crate::error::LeximaxError;
use crate::options::Formalism;
use crate::options::LpSolver;
use crate::termination::TerminationSignal;

/// How often the child and the termination flag are polled.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Beat between SIGTERM and SIGKILL when tearing the child down.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Result of one external-solver call.
#[derive(Debug, Clone)]
pub(crate) enum SolverVerdict {
    Satisfied(Assignment),
    Unsatisfiable,
    /// Deadline or termination fired; the child was killed. Anytime solvers
    /// may still have printed a usable model.
    Interrupted(Option<Assignment>),
}

/// Drives the configured external optimisation solver.
///
/// One driver instance serves a whole solve; every call gets its own
/// uniquely stamped input file so retained scratch files never collide.
#[derive(Debug)]
pub(crate) struct ExternalSolver {
    pub(crate) command: String,
    pub(crate) formalism: Formalism,
    pub(crate) lp_solver: LpSolver,
    pub(crate) separator: String,
    pub(crate) tmp_dir: PathBuf,
    pub(crate) leave_tmp_files: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) termination: TerminationSignal,
    stamp: u32,
    call_counter: u32,
}

impl ExternalSolver {
    #[allow(clippy::too_many_arguments, reason = "plain configuration hand-over")]
    pub(crate) fn new(
        command: String,
        formalism: Formalism,
        lp_solver: LpSolver,
        separator: String,
        tmp_dir: PathBuf,
        leave_tmp_files: bool,
        timeout: Option<Duration>,
        termination: TerminationSignal,
    ) -> ExternalSolver {
        ExternalSolver {
            command,
            formalism,
            lp_solver,
            separator,
            tmp_dir,
            leave_tmp_files,
            timeout,
            termination,
            stamp: SmallRng::from_entropy().gen(),
            call_counter: 0,
        }
    }

    /// Writes the current snapshot plus the minimisation objective, runs the
    /// solver and maps its output back to an assignment.
    pub(crate) fn solve(
        &mut self,
        store: &ClauseStore,
        objective: &[Lit],
        top_id: i32,
    ) -> Result<SolverVerdict, LeximaxError> {
        let input_path = self.tmp_dir.join(format!(
            "leximax{:08x}_{}.{}",
            self.stamp, self.call_counter, self.formalism
        ));
        self.call_counter += 1;
        let output_path = PathBuf::from(format!("{}.out", input_path.display()));

        {
            let mut writer = BufWriter::new(File::create(&input_path)?);
            match self.formalism {
                Formalism::Wcnf => write::write_wcnf(&mut writer, store, top_id)?,
                Formalism::Opb => {
                    write::write_opb(&mut writer, store, objective, top_id, &self.separator)?;
                }
                Formalism::Lp => {
                    write::write_lp(&mut writer, store, objective, top_id, &self.separator)?;
                }
            }
            writer.flush()?;
        }
        debug!("wrote solver input {}", input_path.display());

        let verdict = self.run_child(&input_path, &output_path, top_id);
        if !self.leave_tmp_files {
            let _ = fs::remove_file(&input_path);
            let _ = fs::remove_file(&output_path);
        }
        verdict
    }

    fn run_child(
        &self,
        input_path: &Path,
        output_path: &Path,
        top_id: i32,
    ) -> Result<SolverVerdict, LeximaxError> {
        let mut words = self.command.split_whitespace();
        let program = words.next().ok_or_else(|| {
            LeximaxError::InvalidConfig("the external solver command is empty".to_owned())
        })?;
        let out_file = File::create(output_path)?;
        let mut child = Command::new(program)
            .args(words)
            .arg(input_path)
            .stdout(Stdio::from(out_file))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LeximaxError::SolverSpawnFailed {
                command: self.command.clone(),
                source,
            })?;
        info!("external solver running (pid {})", child.id());

        let started = Instant::now();
        let exit_status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            let out_of_time = self
                .timeout
                .is_some_and(|limit| started.elapsed() >= limit);
            if out_of_time || self.termination.is_set() {
                warn!("stopping the external solver (deadline or termination)");
                stop_child(&mut child);
                break None;
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let output_text = fs::read_to_string(output_path).unwrap_or_default();
        match exit_status {
            None => {
                // interrupted: salvage whatever the solver managed to print
                let model = match parse_output(self.formalism, self.lp_solver, &output_text, top_id)
                {
                    Ok(ParsedOutput::Model(assignment)) => Some(assignment),
                    _ => None,
                };
                Ok(SolverVerdict::Interrupted(model))
            }
            Some(status) => {
                match parse_output(self.formalism, self.lp_solver, &output_text, top_id)? {
                    // a model in the output trumps any exit code: several
                    // solvers exit 10/20 on success
                    ParsedOutput::Model(assignment) => Ok(SolverVerdict::Satisfied(assignment)),
                    ParsedOutput::Unsatisfiable => Ok(SolverVerdict::Unsatisfiable),
                    ParsedOutput::Inconclusive => Err(LeximaxError::SolverError(format!(
                        "no model in the output of `{}` ({status})",
                        self.command
                    ))),
                }
            }
        }
    }
}

/// SIGTERM, a grace period, then SIGKILL. The child is always reaped before
/// returning, so no orphan survives the call.
fn stop_child(child: &mut Child) {
    let pid = Pid::from_raw(child.id() as i32);
    let _ = kill(pid, Signal::SIGTERM);
    let grace_deadline = Instant::now() + KILL_GRACE;
    while Instant::now() < grace_deadline {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(_) => break,
        }
    }
    let _ = kill(pid, Signal::SIGKILL);
    let _ = child.wait();
}
