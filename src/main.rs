use adapter_demux::demux::{run_demux, DemuxConfig, DemuxJob};
use adapter_demux::types::AdapterDefinition;
use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract inserts flanked by adapter hits from long reads
    Demux {
        /// PAF file of reads aligned to the adapter templates (minimap2 --cs)
        #[arg(short = 'p', long)]
        paf: String,

        /// Read FASTQ file, gzip compressed when ending in .gz
        #[arg(short = 'r', long)]
        reads: String,

        /// Output path for the gzip compressed inserts
        #[arg(short = 'o', long, required_unless_present = "count")]
        output: Option<String>,

        /// Adapter name, hits are expected against <name>_i5 and <name>_i7
        #[arg(short = 'a', long)]
        adapter_name: String,

        /// i5 index sequence, leave out for single index runs
        #[arg(long)]
        i5_index: Option<String>,

        /// i7 index sequence
        #[arg(long)]
        i7_index: String,

        /// Length of the masked i5 region in the adapter template
        #[arg(long, default_value_t = 8)]
        i5_mask_len: usize,

        /// Length of the masked i7 region in the adapter template
        #[arg(long, default_value_t = 8)]
        i7_mask_len: usize,

        /// Maximum edit distance between observed and expected index
        #[arg(short = 'd', long, default_value_t = 1)]
        max_distance: usize,

        /// Write accepted insert intervals as BED
        #[arg(long)]
        bed: Option<String>,

        /// Only count demuxable reads, do not write reads
        #[arg(long, default_value_t = false)]
        count: bool,

        /// Count reads with a rejected pair that still had one matched index
        #[arg(long, default_value_t = false)]
        report_partial: bool,

        /// Enable verbose output for debugging
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
}

fn main() {
    print_banner();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demux {
            paf,
            reads,
            output,
            adapter_name,
            i5_index,
            i7_index,
            i5_mask_len,
            i7_mask_len,
            max_distance,
            bed,
            count,
            report_partial,
            verbose,
        } => {
            let adapter = AdapterDefinition::new(
                &adapter_name,
                i5_index.as_deref(),
                &i7_index,
                i5_mask_len,
                i7_mask_len,
            );
            let config = DemuxConfig::new()
                .with_max_distance(max_distance)
                .with_verbose(verbose)
                .with_count_only(count)
                .with_partial_report(report_partial);
            let job = DemuxJob {
                paf,
                reads,
                output,
                bed,
            };

            let outcome = run_demux(&job, &adapter, &config)
                .with_context(|| format!("Demultiplexing {} failed", job.reads));
            match outcome {
                Ok(_) => println!("{}", "Demultiplexing complete!".green()),
                Err(e) => {
                    eprintln!("{} {:#}", "Error:".red(), e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn print_banner() {
    println!(
        "{}",
        "        [i7]------------------ insert ------------------[i5]        ".bright_yellow()
    );
}
