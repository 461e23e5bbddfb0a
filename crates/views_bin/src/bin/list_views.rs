use std::io::{self, BufWriter};

use clap::Parser;
use views_bin::args::Arguments;

fn main() {
    let args = Arguments::parse();
    logutil::configure_global_logger(args.log_level, args.log_format.into(), io::stderr);

    let mut stdout = BufWriter::new(io::stdout().lock());
    if let Err(err) = views_bin::run(&args, &mut stdout) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}
