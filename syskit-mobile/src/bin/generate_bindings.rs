//! Generates Kotlin, Swift or Python bindings from the compiled
//! `syskit_mobile` library.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use uniffi_bindgen::bindings::{
    KotlinBindingGenerator, PythonBindingGenerator, SwiftBindingGenerator,
};
use uniffi_bindgen::library_mode::generate_bindings;
use uniffi_bindgen::EmptyCrateConfigSupplier;

#[derive(Parser)]
#[command(name = "generate-bindings")]
#[command(about = "Generate UniFFI bindings for syskit-mobile")]
struct Cli {
    /// Path to the compiled library (.so, .dylib or .a)
    #[arg(long, default_value = "../target/release/libsyskit_mobile.so")]
    library: Utf8PathBuf,

    /// Output language
    #[arg(short = 'l', long = "language", default_value = "kotlin")]
    language: Language,

    /// Output directory (defaults to `<language>/generated`)
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Language {
    Kotlin,
    Swift,
    Python,
}

impl Language {
    fn dir_name(self) -> &'static str {
        match self {
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Python => "python",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !cli.library.exists() {
        anyhow::bail!("Library not found: {}", cli.library);
    }

    let out_dir = cli
        .out_dir
        .unwrap_or_else(|| Utf8PathBuf::from(cli.language.dir_name()).join("generated"));
    std::fs::create_dir_all(&out_dir)?;

    println!(
        "Generating {} bindings from {} into {}",
        cli.language.dir_name(),
        cli.library,
        out_dir
    );

    match cli.language {
        Language::Kotlin => {
            generate_bindings(
                &cli.library,
                None,
                &KotlinBindingGenerator,
                &EmptyCrateConfigSupplier,
                None,
                &out_dir,
                false,
            )?;
        }
        Language::Swift => {
            generate_bindings(
                &cli.library,
                None,
                &SwiftBindingGenerator,
                &EmptyCrateConfigSupplier,
                None,
                &out_dir,
                false,
            )?;
        }
        Language::Python => {
            generate_bindings(
                &cli.library,
                None,
                &PythonBindingGenerator,
                &EmptyCrateConfigSupplier,
                None,
                &out_dir,
                false,
            )?;
        }
    }

    println!("Bindings generated");
    Ok(())
}
