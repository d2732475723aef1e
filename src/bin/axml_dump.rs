use anyhow::{bail, Context, Result};
use axml::{Apk, BinaryXml};
use clap::{Arg, ArgAction, Command};
use log::Level;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

struct AxmlDump {
    input: PathBuf,
    output: Option<PathBuf>,
    show_properties: bool,
    set_debuggable: bool,
}

fn is_apk(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("apk"))
        .unwrap_or(false)
}

impl AxmlDump {
    fn run(&self) -> Result<()> {
        if self.show_properties {
            return self.dump_properties();
        }
        if self.set_debuggable {
            return self.patch_debuggable();
        }
        self.dump_manifest()
    }

    fn dump_properties(&self) -> Result<()> {
        if !is_apk(&self.input) {
            bail!("--properties requires an .apk input");
        }

        let properties = Apk::new(&self.input)
            .properties()
            .with_context(|| format!("failed to read {}", self.input.display()))?;

        let mut output = self.open_output()?;
        for (key, value) in &properties {
            writeln!(output, "{key}={value}")?;
        }
        Ok(())
    }

    fn patch_debuggable(&self) -> Result<()> {
        let Some(output_path) = &self.output else {
            bail!("--set-debuggable writes binary XML; pass -o FILE");
        };

        let patched = if is_apk(&self.input) {
            Apk::new(&self.input)
                .make_debuggable()
                .with_context(|| format!("failed to patch {}", self.input.display()))?
        } else {
            let mut manifest = BinaryXml::new(self.read_input()?);
            manifest
                .set_element_attribute(&["manifest", "application"], "debuggable", "true")
                .context("failed to patch manifest")?;
            manifest.into_bytes()
        };

        fs::write(output_path, patched)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        Ok(())
    }

    fn dump_manifest(&self) -> Result<()> {
        let xml = if is_apk(&self.input) {
            Apk::new(&self.input)
                .android_manifest()
                .with_context(|| format!("failed to read {}", self.input.display()))?
        } else {
            BinaryXml::new(self.read_input()?).to_text_xml()
        };

        let mut output = self.open_output()?;
        writeln!(output, "{xml}")?;
        Ok(())
    }

    fn read_input(&self) -> Result<Vec<u8>> {
        fs::read(&self.input).with_context(|| format!("failed to read {}", self.input.display()))
    }

    fn open_output(&self) -> Result<Box<dyn Write>> {
        match &self.output {
            Some(path) => {
                let file = fs::File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Ok(Box::new(file))
            }
            None => Ok(Box::new(std::io::stdout())),
        }
    }
}

fn main() -> Result<()> {
    let matches = Command::new("axml_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Decodes Android binary XML, either from an .apk archive or a bare compiled xml file")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .help("An .apk archive or a compiled binary XML file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write output to a file instead of stdout"),
        )
        .arg(
            Arg::new("properties")
                .long("properties")
                .action(ArgAction::SetTrue)
                .help("Print the APK property map instead of the manifest"),
        )
        .arg(
            Arg::new("set-debuggable")
                .long("set-debuggable")
                .action(ArgAction::SetTrue)
                .help("Rewrite the debuggable attribute to \"true\" (length-preserving) and write the patched binary"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .get_matches();

    let verbosity = match matches.get_count("verbose") {
        0 => None,
        1 => Some(Level::Info),
        2 => Some(Level::Debug),
        _ => Some(Level::Trace),
    };
    if let Some(level) = verbosity {
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .init();
    }

    let dump = AxmlDump {
        input: PathBuf::from(matches.get_one::<String>("INPUT").expect("required")),
        output: matches.get_one::<String>("output").map(PathBuf::from),
        show_properties: matches.get_flag("properties"),
        set_debuggable: matches.get_flag("set-debuggable"),
    };

    dump.run()
}
