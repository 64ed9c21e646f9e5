//! Invocación de una herramienta externa.
//!
//! El motor trata a la herramienta como colaborador opaco: le pasa parámetros
//! por argumentos/ambiente/script de control generado, y sólo observa exit
//! status, streams capturados a logs dentro del sandbox y duración de pared.
//! Exit distinto de cero es fallo salvo que el caller lo acepte explícitamente
//! como warning. Al vencer el timeout el proceso se termina y los logs
//! parciales quedan en disco como diagnóstico.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::errors::ExecError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Builder de una invocación, anclada al sandbox del step (`cwd`).
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    cwd: PathBuf,
    log_stem: String,
    timeout: Option<Duration>,
    accepted_exit_codes: Vec<i32>,
}

/// Lo observado de una invocación exitosa (o aceptada).
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
    pub duration: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let log_stem = Path::new(&program).file_stem()
                                          .map(|s| s.to_string_lossy().into_owned())
                                          .unwrap_or_else(|| "tool".to_string());
        Self { program,
               args: Vec::new(),
               envs: Vec::new(),
               cwd: cwd.into(),
               log_stem,
               timeout: None,
               accepted_exit_codes: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((name.into(), value.into()));
        self
    }

    /// Prefijo de los archivos de log (`<stem>.log` / `<stem>.err.log`).
    pub fn log_stem(mut self, stem: impl Into<String>) -> Self {
        self.log_stem = stem.into();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Acepta `code` como salida no fatal; queda registrado como warning.
    pub fn accept_exit(mut self, code: i32) -> Self {
        self.accepted_exit_codes.push(code);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Lanza el proceso y espera su salida (bloqueante, con timeout).
    pub fn run(self) -> Result<ToolOutput, ExecError> {
        let stdout_log = self.cwd.join(format!("{}.log", self.log_stem));
        let stderr_log = self.cwd.join(format!("{}.err.log", self.log_stem));
        let stdout_file = File::create(&stdout_log).map_err(|e| ExecError::Io { detail: e.to_string() })?;
        let stderr_file = File::create(&stderr_log).map_err(|e| ExecError::Io { detail: e.to_string() })?;

        log::info!("exec: {} {} (cwd {})", self.program, self.args.join(" "), self.cwd.display());
        let mut child = Command::new(&self.program).args(&self.args)
                                                   .envs(self.envs.iter().map(|(k, v)| (k, v)))
                                                   .current_dir(&self.cwd)
                                                   .stdin(Stdio::null())
                                                   .stdout(Stdio::from(stdout_file))
                                                   .stderr(Stdio::from(stderr_file))
                                                   .spawn()
                                                   .map_err(|e| ExecError::Spawn { program: self.program.clone(),
                                                                                   detail: e.to_string() })?;

        let start = Instant::now();
        let status = match self.timeout {
            None => child.wait().map_err(|e| ExecError::Io { detail: e.to_string() })?,
            Some(limit) => loop {
                match child.try_wait().map_err(|e| ExecError::Io { detail: e.to_string() })? {
                    Some(status) => break status,
                    None => {
                        if start.elapsed() >= limit {
                            let _ = child.kill();
                            let _ = child.wait();
                            log::warn!("'{}' killed after {}s; partial logs kept at {}",
                                       self.program,
                                       limit.as_secs(),
                                       stdout_log.display());
                            return Err(ExecError::Timeout { program: self.program,
                                                            seconds: limit.as_secs() });
                        }
                        std::thread::sleep(POLL_INTERVAL);
                    }
                }
            },
        };
        let duration = start.elapsed();

        let output = ToolOutput { exit_code: status.code().unwrap_or(-1), stdout_log, stderr_log, duration };
        match status.code() {
            Some(0) => {
                log::debug!("'{}' ok in {:.1}s", self.program, duration.as_secs_f64());
                Ok(output)
            }
            Some(code) if self.accepted_exit_codes.contains(&code) => {
                log::warn!("'{}' exited {code}; accepted as warning", self.program);
                Ok(output)
            }
            Some(code) => Err(ExecError::Exit { program: self.program, code }),
            None => Err(ExecError::Killed { program: self.program }),
        }
    }
}

/// Escribe un script de control generado dentro del sandbox.
pub fn write_script(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, ExecError> {
    let path = dir.join(name);
    std::fs::write(&path, contents).map_err(|e| ExecError::Io { detail: e.to_string() })?;
    Ok(path)
}
