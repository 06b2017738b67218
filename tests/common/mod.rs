use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Behaves like `minizinc -c` for well-formed invocations: fails for models
/// named `bad*` and writes a one-line FlatZinc file otherwise.
const FAKE_MINIZINC: &str = r#"#!/bin/sh
model=""
fzn=""
while [ $# -gt 0 ]; do
    case "$1" in
        --fzn) fzn="$2"; shift ;;
        --solver) shift ;;
        *.mzn) model="$1" ;;
    esac
    shift
done
echo "$model" >> "$(dirname "$0")/invocations.txt"
case "$(basename "$model")" in
    bad*) echo "Error: syntax error in $model" >&2; exit 1 ;;
esac
echo "solve satisfy;" > "$fzn"
"#;

pub struct TestEnv {
    _tmp: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub minizinc: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let input = tmp.path().join("models");
        let output = tmp.path().join("flattened");
        fs::create_dir_all(&input).expect("create input dir");

        let tools = tmp.path().join("tools");
        fs::create_dir_all(&tools).expect("create tools dir");
        let minizinc = tools.join("minizinc");
        fs::write(&minizinc, FAKE_MINIZINC).expect("write fake minizinc");
        fs::set_permissions(&minizinc, fs::Permissions::from_mode(0o755))
            .expect("make fake minizinc executable");

        Self {
            _tmp: tmp,
            input,
            output,
            minizinc,
        }
    }

    pub fn touch(&self, relative: &str) {
        let path = self.input.join(relative);
        fs::create_dir_all(path.parent().expect("relative path has a parent"))
            .expect("create model dir");
        fs::write(path, "").expect("write model file");
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mzn-flatten"));
        cmd.arg(&self.input)
            .arg(&self.output)
            .arg("--minizinc-exe")
            .arg(&self.minizinc);
        cmd
    }

    pub fn out(&self, relative: &str) -> PathBuf {
        self.output.join(relative)
    }

    pub fn invocations(&self) -> usize {
        let log = self.minizinc.with_file_name("invocations.txt");
        read_lines(&log)
    }
}

fn read_lines(path: &Path) -> usize {
    fs::read_to_string(path)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}
