// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: component name
fn name_arg() -> Arg {
    Arg::new("name").required(true).help("Component name (e.g. Button)")
}

/// Common argument: registry directory
fn registry_dir_arg() -> Arg {
    Arg::new("registry_dir")
        .long("registry-dir")
        .value_name("DIR")
        .default_value("registry")
        .help("Registry directory")
}

fn build_cli() -> Command {
    Command::new("wpsyde")
        .version(env!("CARGO_PKG_VERSION"))
        .author("WPSyde Contributors")
        .about("Versioned, integrity-checked component registry and installer for WordPress themes")
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .default_value("wpsyde.json")
                .global(true)
                .help("Project state file"),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .value_name("URL")
                .global(true)
                .help("Registry URL or directory, overriding the state file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity"),
        )
        .subcommand(Command::new("init").about("Create wpsyde.json in the current directory"))
        .subcommand(Command::new("list").about("List components available in the registry"))
        .subcommand(
            Command::new("add")
                .about("Install components into the theme")
                .arg(
                    Arg::new("names")
                        .num_args(0..)
                        .help("Component names, optionally followed by a version"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Install every component in the registry"),
                )
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Skip the confirmation prompt for --all"),
                ),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove an installed component")
                .arg(name_arg()),
        )
        .subcommand(Command::new("health").about("Check that the registry is reachable"))
        .subcommand(
            Command::new("package")
                .about("Package a components tree into a registry")
                .arg(
                    Arg::new("components_dir")
                        .long("components-dir")
                        .value_name("DIR")
                        .default_value("components")
                        .help("Directory holding one folder per component"),
                )
                .arg(registry_dir_arg())
                .arg(
                    Arg::new("version")
                        .long("version")
                        .default_value("1.0.0")
                        .help("Version to publish"),
                )
                .arg(
                    Arg::new("only")
                        .long("only")
                        .value_delimiter(',')
                        .help("Only package these components"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify the structure and integrity of a registry directory")
                .arg(Arg::new("dir").default_value("registry").help("Registry directory")),
        )
        .subcommand(
            Command::new("check-immutable")
                .about("Fail if any published version changed between two registry trees")
                .arg(
                    Arg::new("base")
                        .required(true)
                        .help("Registry tree before the change"),
                )
                .arg(
                    Arg::new("current")
                        .default_value("registry")
                        .help("Registry tree after the change"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve a registry directory over HTTP (requires the server feature)")
                .arg(
                    Arg::new("bind")
                        .short('b')
                        .long("bind")
                        .default_value("127.0.0.1:3001")
                        .help("Address to listen on"),
                )
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .default_value("registry")
                        .help("Registry directory"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true).help("Target shell")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("wpsyde.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
