use std::process::Command;

/// Run a git command and return its trimmed stdout, or `None` if git is
/// missing or the command fails (e.g. building from a source tarball).
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_default();
    let on_tag = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    println!("cargo:rustc-env=BEE_GIT_HASH={hash}");
    println!("cargo:rustc-env=BEE_ON_RELEASE_TAG={on_tag}");
}
