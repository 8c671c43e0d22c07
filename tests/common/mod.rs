//! Shared fixtures for the integration tests: a fake AsciiDoc toolchain and
//! a small DocBook book.
//!
//! * fake `asciidoc` echoes the source file to stdout for `-o -` (sources
//!   here are already DocBook), or writes a stub page for `-o <file>`;
//! * fake `a2x` writes `<dir>/<stem>.pdf` for `-D <dir>`;
//! * both print a warning on stderr and fail for any source whose name
//!   contains `fail`.

#![allow(dead_code)]

use docbatch::Toolchain;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const FAKE_ASCIIDOC: &str = r#"#!/bin/sh
out=""
src=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -a|-b|-d) shift 2 ;;
    *) src="$1"; shift ;;
  esac
done
case "$src" in
  *fail*) echo "asciidoc: ERROR: $src: line 1: forced failure" >&2; exit 1 ;;
esac
echo "asciidoc: WARNING: $src: line 2: fake warning" >&2
if [ "$out" = "-" ]; then
  cat "$src"
else
  printf '<html>%s</html>\n' "$src" > "$out"
fi
"#;

pub const FAKE_A2X: &str = r#"#!/bin/sh
dir=""
src=""
while [ $# -gt 0 ]; do
  case "$1" in
    -f|-D) [ "$1" = "-D" ] && dir="$2"; shift 2 ;;
    --fop) shift ;;
    *) src="$1"; shift ;;
  esac
done
case "$src" in
  *fail*) echo "a2x: ERROR: fop exited with 1" >&2; exit 1 ;;
esac
stem=$(basename "$src")
stem="${stem%.*}"
printf '%%PDF-1.4 fake\n' > "$dir/$stem.pdf"
"#;

pub const THREE_CHAPTERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE book PUBLIC "-//OASIS//DTD DocBook XML V4.5//EN" "http://www.oasis-open.org/docbook/xml/4.5/docbookx.dtd">
<book lang="en">
<bookinfo><title>Guide</title></bookinfo>
<chapter id="c1"><title>One</title></chapter>
<chapter id="c2"><title>Two</title></chapter>
<chapter id="c3"><title>Three</title></chapter>
</book>
"#;

/// Write the fake tools into their own directory under the cargo target
/// tmpdir. Call once per test binary (behind a `Lazy`): rewriting an
/// executable while other threads fork can make exec fail with ETXTBSY.
pub fn install_fake_toolchain(name: &str) -> Toolchain {
    let bin = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(format!("docbatch-fake-tools-{name}"));
    std::fs::create_dir_all(&bin).unwrap();
    Toolchain {
        asciidoc: write_script(&bin, "asciidoc", FAKE_ASCIIDOC),
        a2x: write_script(&bin, "a2x", FAKE_A2X),
        icons_dir: PathBuf::from("/usr/share/icons"),
    }
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
