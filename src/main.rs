use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use recoveryrs::{
    AthleteMetrics, Domain, EngineConfig, Grade, InjuryRiskFactors, LogLevel, Priority,
    RecoveryEngine, RiskLevel, SyntheticProvider, SystemClock, TrajectoryRequest,
};

/// RecoveryRS - Athlete Recovery Scoring CLI
///
/// Scores sleep, nutrition, stress and workload into a composite recovery
/// analysis, projects performance trajectories and classifies injury risk.
/// Sample data comes from a seeded synthetic provider.
#[derive(Parser)]
#[command(name = "recoveryrs")]
#[command(author = "RecoveryRS Contributors")]
#[command(version)]
#[command(about = "Athlete Recovery Scoring CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Seed for the synthetic data provider
    #[arg(long, default_value = "42", global = true)]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite recovery analysis for one athlete
    Analyze {
        #[arg(short, long)]
        athlete: String,

        /// Lookback window in days (defaults to the configured value)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Per-domain and overall recovery trends
    Trends {
        #[arg(short, long)]
        athlete: String,

        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Project performance over upcoming training periods
    Trajectory {
        #[arg(long)]
        age: Option<f64>,

        /// Years of structured training
        #[arg(long)]
        experience: Option<f64>,

        /// Weekly training hours
        #[arg(long)]
        hours: Option<f64>,

        #[arg(long)]
        recovery: Option<f64>,

        /// Number of previous injuries
        #[arg(long)]
        injuries: Option<u32>,

        #[arg(short, long)]
        periods: Option<u32>,
    },

    /// Classify injury risk
    InjuryRisk {
        #[arg(long)]
        workload: f64,

        #[arg(long)]
        recovery: f64,

        #[arg(long)]
        age: f64,

        #[arg(long, default_value = "0")]
        injuries: u32,

        #[arg(long)]
        intensity: f64,
    },

    /// Rank an athlete against peers on recovery domain scores
    Compare {
        #[arg(short, long)]
        athlete: String,

        /// Comma-separated peer athlete IDs
        #[arg(short, long, value_delimiter = ',')]
        peers: Vec<String>,

        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Inspect or initialize the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the default configuration path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Tabled)]
struct DomainRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Grade")]
    grade: String,
    #[tabled(rename = "Recommendations")]
    recommendations: usize,
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Series")]
    series: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Slope/day")]
    slope: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Improvement")]
    improvement: String,
    #[tabled(rename = "7-day forecast")]
    forecast: String,
}

#[derive(Tabled)]
struct TrajectoryRow {
    #[tabled(rename = "Period")]
    period: u32,
    #[tabled(rename = "Predicted")]
    predicted: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Factors")]
    factors: String,
}

#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Percentile")]
    percentile: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Peer median")]
    median: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::load_or_default()?,
    };

    // Set up logging based on verbosity
    match cli.verbose {
        0 => {}
        1 => config.logging.level = LogLevel::Info,
        2 => config.logging.level = LogLevel::Debug,
        _ => config.logging.level = LogLevel::Trace,
    }
    let _log_guard = recoveryrs::logging::init_logging(&config.logging)
        .context("Failed to initialize logging")?;

    let provider = Arc::new(SyntheticProvider::new(cli.seed, Utc::now().date_naive()));
    let engine = RecoveryEngine::from_config(provider, Arc::new(SystemClock), config.clone())?;
    let defaults = &config.analysis;

    match cli.command {
        Commands::Config { action } => {
            run_config(&action, &config, cli.config.as_ref(), cli.json)?;
        }

        Commands::Analyze { athlete, days } => {
            let days = days.unwrap_or(defaults.default_timeframe_days);
            let analysis = engine.analyze_recovery(&athlete, days)?;
            if cli.json {
                return print_json(analysis.as_ref());
            }

            println!(
                "{} {} ({} days)",
                "Recovery analysis for".cyan().bold(),
                athlete.bold(),
                days
            );
            println!(
                "  Optimization score: {}",
                colored_score(f64::from(analysis.optimization_score))
            );

            let rows: Vec<DomainRow> = analysis
                .domain_scores
                .values()
                .map(|s| DomainRow {
                    domain: s.domain.to_string(),
                    score: format!("{:.1}", s.score),
                    grade: colored_grade(s.grade),
                    recommendations: s.recommendations.len(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()).to_string());

            if !analysis.risk_factors.is_empty() {
                println!("\n{}", "Risk factors".red().bold());
                for factor in &analysis.risk_factors {
                    println!("  [{}] {} - {}", factor.severity, factor.description, factor.impact);
                }
            }

            if !analysis.recommendations.is_empty() {
                println!("\n{}", "Recommendations".green().bold());
                for rec in &analysis.recommendations {
                    println!("  {} {}", colored_priority(rec.priority), rec.message);
                    for action in &rec.actions {
                        println!("      - {}", action);
                    }
                }
            }
        }

        Commands::Trends { athlete, days } => {
            let days = days.unwrap_or(defaults.default_timeframe_days);
            let trends = engine.get_recovery_trends(&athlete, days)?;
            if cli.json {
                return print_json(&trends);
            }

            println!(
                "{} {} ({} days)",
                "Recovery trends for".cyan().bold(),
                athlete.bold(),
                days
            );

            let mut rows: Vec<TrendRow> = trends
                .domains
                .iter()
                .map(|(domain, trend)| trend_row(domain.to_string(), &trend.summary))
                .collect();
            if let Some(overall) = &trends.overall {
                rows.push(trend_row("overall".to_string(), &overall.summary));
            }
            println!("{}", Table::new(rows).with(Style::rounded()).to_string());
        }

        Commands::Trajectory {
            age,
            experience,
            hours,
            recovery,
            injuries,
            periods,
        } => {
            let features = TrajectoryRequest {
                age,
                experience,
                training_hours: hours,
                recovery_score: recovery,
                injury_history: injuries,
            }
            .into_features()?;
            let periods = periods.unwrap_or(defaults.default_horizon_periods);
            let prediction = engine.predict_performance_trajectory(&features, periods)?;
            if cli.json {
                return print_json(&prediction);
            }

            let rows: Vec<TrajectoryRow> = prediction
                .trajectory
                .iter()
                .map(|p| TrajectoryRow {
                    period: p.period,
                    predicted: format!("{:.1}", p.predicted_score),
                    confidence: format!("{:.2}", p.confidence),
                    factors: p.influencing_factors.join(", "),
                })
                .collect();
            println!("{}", "Performance trajectory".cyan().bold());
            println!("{}", Table::new(rows).with(Style::rounded()).to_string());

            let insights = &prediction.insights;
            println!(
                "  Peak {:.1} at period {}, average {:.1}, net change {:+.1}, {}",
                insights.peak_score,
                insights.peak_period,
                insights.average_score,
                insights.net_change,
                insights.direction
            );
            for rec in &prediction.recommendations {
                println!("  {} {}", colored_priority(rec.priority), rec.message);
            }
        }

        Commands::InjuryRisk {
            workload,
            recovery,
            age,
            injuries,
            intensity,
        } => {
            let assessment = engine.predict_injury_risk(&InjuryRiskFactors {
                workload,
                recovery_score: recovery,
                age,
                previous_injuries: injuries,
                training_intensity: intensity,
            })?;
            if cli.json {
                return print_json(&assessment);
            }

            let level = match assessment.level {
                RiskLevel::High => assessment.level.to_string().red().bold(),
                RiskLevel::Medium => assessment.level.to_string().yellow().bold(),
                RiskLevel::Low => assessment.level.to_string().green().bold(),
            };
            println!(
                "Injury risk: {} (score {}, probability {:.1}%)",
                level,
                assessment.risk_score,
                assessment.probability * 100.0
            );
            for factor in &assessment.factors {
                println!("  [{}] {}", factor.severity, factor.description);
            }
            for rec in &assessment.recommendations {
                println!("  {} {}", colored_priority(rec.priority), rec.message);
            }
        }

        Commands::Compare {
            athlete,
            peers,
            days,
        } => {
            let days = days.unwrap_or(defaults.default_timeframe_days);
            let mut ids = vec![athlete.clone()];
            ids.extend(peers.into_iter().filter(|p| *p != athlete));

            let batch = engine.analyze_recovery_batch(&ids, days);
            let mut group = Vec::with_capacity(batch.results.len());
            for (id, result) in batch.results {
                let analysis = result.with_context(|| format!("Failed to analyze athlete {}", id))?;
                let mut metrics = AthleteMetrics::new(id)
                    .with_metric("optimization", f64::from(analysis.optimization_score));
                for domain in Domain::ALL {
                    if let Some(score) = analysis.domain_scores.get(&domain) {
                        metrics = metrics.with_metric(&domain.to_string(), score.score);
                    }
                }
                group.push(metrics);
            }

            let comparison = engine.generate_comparative_analysis(&athlete, &group)?;
            if cli.json {
                return print_json(&comparison);
            }

            println!(
                "{} {} against {} athletes",
                "Comparing".cyan().bold(),
                athlete.bold(),
                comparison.peer_group_size
            );
            let rows: Vec<RankingRow> = comparison
                .rankings
                .iter()
                .map(|(metric, ranking)| RankingRow {
                    metric: metric.clone(),
                    value: format!("{:.1}", ranking.value),
                    percentile: format!("{:.1}", ranking.percentile),
                    tier: ranking.tier.to_string(),
                    median: comparison
                        .benchmarks
                        .get(metric)
                        .map(|b| format!("{:.1}", b.median))
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()).to_string());

            if !comparison.strengths.is_empty() {
                println!("  Strengths: {}", comparison.strengths.join(", ").green());
            }
            if !comparison.improvement_areas.is_empty() {
                println!(
                    "  Improvement areas: {}",
                    comparison.improvement_areas.join(", ").yellow()
                );
            }
            let similar: Vec<&str> = comparison
                .similar_athletes
                .iter()
                .map(|s| s.athlete_id.as_str())
                .collect();
            if !similar.is_empty() {
                println!("  Most similar: {}", similar.join(", "));
            }
        }
    }

    Ok(())
}

fn run_config(
    action: &ConfigAction,
    config: &EngineConfig,
    custom_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let path = custom_path
        .cloned()
        .unwrap_or_else(EngineConfig::default_config_path);

    match action {
        ConfigAction::Show => {
            if json {
                print_json(config)?;
            } else {
                let rendered =
                    toml::to_string_pretty(config).context("Failed to render configuration")?;
                println!("{}", rendered);
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            let mut fresh = EngineConfig::default();
            let written = match custom_path {
                Some(custom) => {
                    fresh.save_to_file(custom)?;
                    custom.clone()
                }
                None => fresh.save_default()?,
            };
            println!("{} {}", "✓ Wrote default configuration to".green(), written.display());
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

fn trend_row(series: String, summary: &recoveryrs::TrendSummary) -> TrendRow {
    TrendRow {
        series,
        current: format!("{:.1}", summary.current),
        slope: format!("{:+.2}", summary.slope),
        direction: summary.direction.to_string(),
        improvement: format!("{:+.1}", summary.improvement),
        forecast: format!("{:.1}", summary.forecast_7d),
    }
}

fn colored_score(score: f64) -> ColoredString {
    let text = format!("{:.0}", score);
    if score >= 80.0 {
        text.green().bold()
    } else if score >= 60.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

fn colored_grade(grade: Grade) -> String {
    let text = grade.to_string();
    match grade {
        Grade::A | Grade::B => text.green().to_string(),
        Grade::C => text.yellow().to_string(),
        Grade::D | Grade::F => text.red().to_string(),
    }
}

fn colored_priority(priority: Priority) -> ColoredString {
    let label = format!("[{}]", priority);
    match priority {
        Priority::Critical => label.red().bold(),
        Priority::High => label.red(),
        Priority::Medium => label.yellow(),
        Priority::Low => label.dimmed(),
    }
}
