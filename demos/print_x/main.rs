use std::{
    env,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;
use xfile::{Diagnostic, ParseOptions, TemplateRegistry, XFile};

fn do_it(path: &Path, out: &mut impl Write) -> Result<(), io::Error> {
    let options = ParseOptions::default()
        .with_source_name(path.display().to_string())
        .with_report_unknown_templates(true);
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    let file = XFile::from_data_with(
        File::open(path)?,
        &options,
        TemplateRegistry::standard(),
        &mut diagnostics,
    );

    writeln!(out, "== {}", path.display())?;
    if let Ok(file) = file {
        writeln!(
            out,
            "{:?}, {:?} floats",
            file.header.format, file.header.float_width
        )?;
        for structure in file.structures() {
            write!(out, "{}", structure)?;
        }
    }
    for diagnostic in &diagnostics {
        writeln!(out, "{}", diagnostic)?;
    }
    writeln!(out)?;

    Ok(())
}

pub fn main() -> Result<(), io::Error> {
    let dir = match env::args_os().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(
            env::var_os("CARGO_MANIFEST_DIR").expect("could not find cargo manifest dir"),
        )
        .join("tests/fixtures"),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let is_x_file = entry
            .path()
            .extension()
            .map(|e| e.eq_ignore_ascii_case("x"))
            .unwrap_or(false);

        if entry.path().is_file() && is_x_file {
            do_it(entry.path(), &mut out)?;
        }
    }

    out.flush()
}
