use assert_cmd::Command;
use predicates::prelude::*;

const CLOSER_VARS: [&str; 4] = [
    "CLOSER_LOGGING",
    "CLOSER_EXIT_CODE",
    "CLOSER_NOTICE",
    "CLOSER_FORCE_EXIT_ON_REPEAT",
];

fn closer() -> Command {
    let mut cmd = Command::cargo_bin("closer").unwrap();
    for var in CLOSER_VARS {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_run_now_prints_labels_in_reverse() {
    closer()
        .args([
            "--label",
            "close-db",
            "--label",
            "close-cache",
            "--label",
            "flush-logs",
            "--run-now",
        ])
        .assert()
        .success()
        .stdout("flush-logs\nclose-cache\nclose-db\n");
}

#[test]
fn test_run_now_without_labels_prints_nothing() {
    closer().arg("--run-now").assert().success().stdout("");
}

#[test]
fn test_quiet_suppresses_labels() {
    closer()
        .args(["-l", "close-db", "--quiet", "--run-now"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("cleanup action ran"));
}

#[test]
fn test_logging_disabled_through_environment() {
    closer()
        .env("CLOSER_LOGGING", "false")
        .args(["-l", "close-db", "--run-now"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_zero_exit_code_is_rejected() {
    closer()
        .args(["--exit-code", "0", "--run-now"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exit code must be between 1 and 255"));
}

#[cfg(unix)]
mod signals {
    use super::CLOSER_VARS;
    use std::io::{BufRead, BufReader, Read};
    use std::process::{Child, ChildStdout, Command, Stdio};
    use std::thread::JoinHandle;

    /// A running `closer` whose signal listener is installed
    struct Armed {
        child: Child,
        stdout: BufReader<ChildStdout>,
        stderr: JoinHandle<()>,
    }

    impl Armed {
        fn spawn(args: &[&str]) -> Self {
            Self::spawn_with_env(args, &[])
        }

        fn spawn_with_env(args: &[&str], env: &[(&str, &str)]) -> Self {
            let mut cmd = Command::new(env!("CARGO_BIN_EXE_closer"));
            for var in CLOSER_VARS {
                cmd.env_remove(var);
            }
            let mut child = cmd
                .env("RUST_LOG", "info")
                .envs(env.iter().copied())
                .args(args)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .unwrap();

            let mut lines = BufReader::new(child.stderr.take().unwrap()).lines();
            loop {
                let line = lines
                    .next()
                    .expect("closer exited before arming")
                    .unwrap();
                if line.contains("signal shutdown armed") {
                    break;
                }
            }
            // Keep draining stderr so the child never blocks on a full pipe.
            let stderr = std::thread::spawn(move || for _ in lines {});

            let stdout = BufReader::new(child.stdout.take().unwrap());
            Self {
                child,
                stdout,
                stderr,
            }
        }

        fn kill(&self, signal: libc::c_int) {
            let pid = libc::pid_t::try_from(self.child.id()).unwrap();
            // SAFETY: plain kill(2) on a child we own.
            assert_eq!(unsafe { libc::kill(pid, signal) }, 0);
        }

        /// Next console line, without the newline
        fn next_line(&mut self) -> String {
            let mut line = String::new();
            let read = self.stdout.read_line(&mut line).unwrap();
            assert!(read > 0, "closer closed stdout early");
            line.trim_end_matches('\n').to_string()
        }

        /// Remaining stdout and the exit status
        fn finish(mut self) -> (Option<i32>, String) {
            let mut rest = String::new();
            self.stdout.read_to_string(&mut rest).unwrap();
            let status = self.child.wait().unwrap();
            self.stderr.join().unwrap();
            (status.code(), rest)
        }
    }

    /// Send `signal` once the listener reports it is armed, then collect stdout
    fn signal_when_armed(armed: Armed, signal: libc::c_int) -> (Option<i32>, String) {
        armed.kill(signal);
        armed.finish()
    }

    #[test]
    fn test_sigterm_drains_then_exits_with_configured_code() {
        let armed = Armed::spawn(&[
            "-l",
            "close-db",
            "-l",
            "close-cache",
            "-l",
            "flush-logs",
            "--exit-code",
            "3",
        ]);

        let (code, stdout) = signal_when_armed(armed, libc::SIGTERM);

        assert_eq!(code, Some(3));
        assert_eq!(
            stdout,
            "SIGTERM RECEIVED. CLOSING SERVER\nflush-logs\nclose-cache\nclose-db\n"
        );
    }

    #[test]
    fn test_sigint_with_quiet_prints_nothing_and_exits_non_zero() {
        let armed = Armed::spawn(&["-l", "close-db", "--quiet"]);

        let (code, stdout) = signal_when_armed(armed, libc::SIGINT);

        assert_eq!(code, Some(1));
        assert_eq!(stdout, "");
    }

    #[test]
    fn test_custom_notice_is_printed_first() {
        let armed = Armed::spawn(&["-l", "close-db", "--notice", "stopping"]);

        let (code, stdout) = signal_when_armed(armed, libc::SIGTERM);

        assert_eq!(code, Some(1));
        assert_eq!(stdout, "stopping\nclose-db\n");
    }

    #[test]
    fn test_second_signal_during_slow_drain_exits_at_once() {
        let mut armed = Armed::spawn(&[
            "-l",
            "close-db",
            "-l",
            "flush-logs",
            "--exit-code",
            "2",
            "--action-delay-ms",
            "3000",
        ]);

        armed.kill(libc::SIGTERM);
        assert_eq!(armed.next_line(), "SIGTERM RECEIVED. CLOSING SERVER");
        // The label is printed before its action starts sleeping.
        assert_eq!(armed.next_line(), "flush-logs");
        armed.kill(libc::SIGINT);

        let (code, rest) = armed.finish();
        assert_eq!(code, Some(2));
        assert!(!rest.contains("close-db"), "drain kept running: {rest:?}");
    }

    #[test]
    fn test_second_signal_is_ignored_when_force_exit_is_off() {
        let mut armed = Armed::spawn_with_env(
            &[
                "-l",
                "close-db",
                "-l",
                "flush-logs",
                "--exit-code",
                "2",
                "--action-delay-ms",
                "300",
            ],
            &[("CLOSER_FORCE_EXIT_ON_REPEAT", "false")],
        );

        armed.kill(libc::SIGTERM);
        assert_eq!(armed.next_line(), "SIGTERM RECEIVED. CLOSING SERVER");
        assert_eq!(armed.next_line(), "flush-logs");
        armed.kill(libc::SIGINT);

        let (code, rest) = armed.finish();
        assert_eq!(code, Some(2));
        assert_eq!(rest, "close-db\n");
    }
}
