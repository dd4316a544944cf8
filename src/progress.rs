use colored::*;
use std::time::Instant;

pub struct ProgressTracker {
    start_time: Instant,
    indent_level: usize,
    verbose: bool,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            indent_level: 0,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn step(&mut self, message: &str) {
        let indent = "  ".repeat(self.indent_level);
        println!("{}{} {}", indent, "•".blue(), message.bold());
    }

    pub fn substep(&mut self, message: &str) {
        let indent = "  ".repeat(self.indent_level + 1);
        println!("{}{} {}", indent, "◦".cyan(), message);
    }

    /// Only printed in verbose mode
    pub fn debug(&mut self, message: &str) {
        if !self.verbose {
            return;
        }
        let indent = "  ".repeat(self.indent_level + 2);
        eprintln!("{}{} {}", indent, "·".dimmed(), message.dimmed());
    }

    pub fn success(&mut self, message: &str) {
        let indent = "  ".repeat(self.indent_level);
        println!("{}{} {}", indent, "✓".green(), message.green().bold());
    }

    pub fn warning(&mut self, message: &str) {
        let indent = "  ".repeat(self.indent_level);
        println!("{}{} {}", indent, "⚠".yellow(), message.yellow());
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn print_elapsed(&self) {
        let elapsed = self.elapsed();
        let indent = "  ".repeat(self.indent_level);
        println!(
            "{}{} Completed in {:.2}s",
            indent,
            "⏱".blue(),
            elapsed.as_secs_f64()
        );
    }
}

pub fn print_header(title: &str) {
    println!("\n{}", "=".repeat(60).blue());
    println!("{}", format!("  {}", title).blue().bold());
    println!("{}", "=".repeat(60).blue());
}

pub fn print_adapter_info(adapter: &crate::types::AdapterDefinition) {
    let indent = "  ".repeat(2);

    println!("{}{} {}", indent, "🧬".blue(), "Adapter:".bold());
    println!("{}  Name: {}", indent, adapter.name.cyan());
    match &adapter.i5_index {
        Some(i5) => println!(
            "{}  i5: {} (mask: {} nt, target: {})",
            indent,
            i5.yellow(),
            adapter.i5_mask_len,
            adapter.i5_name()
        ),
        None => println!("{}  i5: {}", indent, "none, single index mode".dimmed()),
    }
    println!(
        "{}  i7: {} (mask: {} nt, target: {})",
        indent,
        adapter.i7_index.yellow(),
        adapter.i7_mask_len,
        adapter.i7_name()
    );
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

pub fn print_summary_stats(summary: &crate::demux::DemuxSummary, elapsed: std::time::Duration) {
    let indent = "  ".repeat(1);
    let sub = "  ".repeat(1);

    println!("{}{} {}", indent, "📈".blue(), "Summary:".bold());
    println!(
        "{}{} Alignment lines: {} (kept {}, low quality {}, malformed {})",
        indent,
        sub,
        summary.alignment_lines.to_string().bold(),
        summary.kept_alignments,
        summary.low_quality,
        summary.malformed_lines
    );
    println!(
        "{}{} Reads with adapter hits: {}",
        indent,
        sub,
        summary.reads.to_string().bold()
    );
    println!(
        "{}{} Demuxed reads: {} ({:.1}%)",
        indent,
        sub,
        summary.layout.demuxed_reads.to_string().green().bold(),
        percent(summary.layout.demuxed_reads, summary.reads)
    );
    println!(
        "{}{} Unresolved reads: {}",
        indent,
        sub,
        summary.layout.unresolved_reads.to_string().red().bold()
    );
    println!(
        "{}{} Reads with missing adaptor: {}",
        indent,
        sub,
        summary.layout.partial_reads
    );
    println!(
        "{}{} Inserts: {}",
        indent,
        sub,
        summary.intervals.to_string().blue().bold()
    );
    if let Some(extract) = &summary.extract {
        println!(
            "{}{} Records written: {} from {} input reads",
            indent,
            sub,
            extract.written_records.to_string().green().bold(),
            extract.total_reads
        );
        if extract.invalid_intervals > 0 {
            println!(
                "{}{} Skipped out of bounds inserts: {}",
                indent,
                sub,
                extract.invalid_intervals.to_string().yellow().bold()
            );
        }
    }
    println!(
        "{}{} Time: {:.2}s",
        indent,
        sub,
        elapsed.as_secs_f64()
    );
}
