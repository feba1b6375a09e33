use anyhow::{Context, Result};
use chrono::{NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};
use uuid::Uuid;

use vitalrs::grocery::Category;
use vitalrs::logging::init_logging;
use vitalrs::{
    parse_weekday, AppConfig, Classification, Database, DailyLogInput, DailyLogKind, Gender,
    GroceryOptions, GroceryPlan, HealthEngine, Level, Lifestyle, LogLevel, Metrics,
    NewWeightGoal, PriceMode, Status, SurveyInput, SystemClock, WeightLogInput,
};

/// VitalRS - Personal Health Metrics CLI
///
/// Derives energy, hydration and sleep targets from a body-metrics survey,
/// tracks weight goals and classifies daily adherence.
#[derive(Parser)]
#[command(name = "vitalrs")]
#[command(author = "VitalRS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Health Metrics & Adherence CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute body metrics and targets from survey answers
    Survey {
        /// male, female, non-binary or other
        #[arg(short, long)]
        gender: Gender,

        #[arg(short, long)]
        age: u32,

        /// Height in centimetres
        #[arg(long)]
        height: f64,

        /// Current weight in kg
        #[arg(short, long)]
        weight: f64,

        /// Target weight in kg
        #[arg(short, long)]
        target_weight: f64,

        /// Days to reach the target weight
        #[arg(short = 'd', long)]
        target_days: u32,

        /// sedentary, light, moderate, active or very_active
        #[arg(short, long, default_value = "moderate")]
        lifestyle: Lifestyle,

        /// Store the survey so goals and logs can use its targets
        #[arg(short, long)]
        save: bool,
    },

    /// Classify a value against a target
    Adherence {
        #[arg(long)]
        value: f64,

        #[arg(long)]
        target: f64,
    },

    /// Score training readiness
    Readiness {
        /// Heart rate variability (ms)
        #[arg(long)]
        hrv: f64,

        /// Resting heart rate (bpm)
        #[arg(long)]
        resting_hr: f64,

        /// Hours slept last night
        #[arg(long)]
        sleep: f64,
    },

    /// Compute accumulated sleep debt
    SleepDebt {
        /// Nightly target (hours)
        #[arg(short, long, default_value = "8")]
        target: f64,

        /// Hours slept per night, oldest first (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        hours: Vec<f64>,
    },

    /// Build a weekly grocery plan
    Grocery {
        /// Daily calorie target
        #[arg(long, conflicts_with = "survey", required_unless_present = "survey")]
        calories: Option<f64>,

        /// Use the calorie target of a stored survey
        #[arg(long)]
        survey: Option<Uuid>,

        /// Include cost estimate, tips and substitutions
        #[arg(short, long)]
        optimize: bool,

        /// budget, standard or premium
        #[arg(short, long)]
        price_mode: Option<PriceMode>,

        /// Allergen to substitute (repeatable)
        #[arg(short, long = "allergy")]
        allergies: Vec<String>,
    },

    /// Manage weight goals
    Goal {
        #[command(subcommand)]
        action: GoalCommands,
    },

    /// Log water intake and show hydration adherence
    Hydration {
        /// Litres drunk
        #[arg(long)]
        liters: Option<f64>,

        /// Day the entry belongs to (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Survey providing the personal target
        #[arg(long)]
        survey: Option<Uuid>,
    },

    /// Log a night of sleep and show sleep adherence
    Sleep {
        /// Hours slept
        #[arg(long)]
        hours: Option<f64>,

        /// Day the entry belongs to (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Survey providing the personal target
        #[arg(long)]
        survey: Option<Uuid>,
    },

    /// Configure application settings
    Config {
        /// Show the active configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(short, long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Create a weight goal
    Create {
        /// Starting weight in kg
        #[arg(long)]
        start: f64,

        /// Target weight in kg
        #[arg(long)]
        target: f64,

        /// Weigh-in days (e.g. mon,thu)
        #[arg(long, value_delimiter = ',', value_parser = parse_weekday)]
        weigh_in: Vec<Weekday>,

        /// Survey linked to the goal
        #[arg(long)]
        survey: Option<Uuid>,
    },

    /// Log a weigh-in against a goal
    Log {
        #[arg(short, long)]
        goal: Uuid,

        /// Weight in kg
        #[arg(short, long)]
        weight: f64,

        /// Litres of water drunk today
        #[arg(long)]
        water: Option<f64>,

        /// Hours slept last night
        #[arg(long)]
        sleep: Option<f64>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show goal progress
    Show {
        #[arg(short, long)]
        goal: Uuid,
    },
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct GroceryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Grams")]
    grams: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&config.logging)?;

    if cli.verbose > 0 {
        eprintln!(
            "{}",
            format!("Log level: {}", config.logging.level).dimmed()
        );
    }

    match cli.command {
        Commands::Survey {
            gender,
            age,
            height,
            weight,
            target_weight,
            target_days,
            lifestyle,
            save,
        } => {
            let input = SurveyInput {
                gender,
                age,
                height_cm: height,
                weight_kg: weight,
                target_weight_kg: target_weight,
                target_days,
                lifestyle,
            };

            if save {
                let mut engine = open_engine(&config)?;
                let stored = engine.submit_survey(input)?;
                if cli.json {
                    return print_json(&stored);
                }
                println!(
                    "{} {}",
                    "✓ Survey saved:".green().bold(),
                    stored.survey.id.to_string().cyan()
                );
                print_metrics(&stored.metrics);
            } else {
                let metrics = vitalrs::MetricsCalculator::compute(&input)?;
                if cli.json {
                    return print_json(&metrics);
                }
                print_metrics(&metrics);
            }
        }

        Commands::Adherence { value, target } => {
            let classification = config.engine.adherence_engine().classifier.classify(value, target)?;
            if cli.json {
                return print_json(&classification);
            }
            print_classification("Adherence", &classification);
        }

        Commands::Readiness {
            hrv,
            resting_hr,
            sleep,
        } => {
            let result = vitalrs::ReadinessScorer::score(hrv, resting_hr, sleep)?;
            if cli.json {
                return print_json(&result);
            }

            println!(
                "{} {} ({})",
                "Readiness:".bold(),
                result.score.to_string().bold(),
                paint_level(result.level)
            );
            let rows = vec![
                MetricRow {
                    name: "HRV",
                    value: format!("{} ms ({})", result.factors.hrv.value, result.factors.hrv.status),
                },
                MetricRow {
                    name: "Resting HR",
                    value: format!(
                        "{} bpm ({})",
                        result.factors.resting_hr.value, result.factors.resting_hr.status
                    ),
                },
                MetricRow {
                    name: "Sleep",
                    value: format!("{} h ({})", result.factors.sleep.value, result.factors.sleep.status),
                },
            ];
            println!("{}", Table::new(rows).with(Style::rounded()));
            for advice in &result.recommendations {
                println!("  • {}", advice);
            }
        }

        Commands::SleepDebt { target, hours } => {
            let result = vitalrs::SleepDebtTracker::compute(target, &hours)?;
            if cli.json {
                return print_json(&result);
            }

            let rows = vec![
                MetricRow {
                    name: "Nights tracked",
                    value: result.days_tracked.to_string(),
                },
                MetricRow {
                    name: "Average sleep",
                    value: format!("{:.2} h", result.average_sleep),
                },
                MetricRow {
                    name: "Sleep debt",
                    value: format!("{:.2} h", result.debt),
                },
                MetricRow {
                    name: "Days to recover",
                    value: result.days_to_recover.to_string(),
                },
                MetricRow {
                    name: "Surplus",
                    value: format!("{:.2} h", result.surplus_hours),
                },
                MetricRow {
                    name: "Worst night",
                    value: format!("{:.1} h", result.worst_night),
                },
            ];
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Grocery {
            calories,
            survey,
            optimize,
            price_mode,
            allergies,
        } => {
            let options = GroceryOptions {
                optimize: optimize || price_mode.is_some() || !allergies.is_empty(),
                price_mode: price_mode.unwrap_or(config.engine.default_price_mode),
                allergies,
            };

            let plan = match (survey, calories) {
                (Some(survey_id), _) => {
                    open_engine(&config)?.build_grocery_plan_for_survey(&survey_id, &options)?
                }
                (None, Some(calories)) => vitalrs::GroceryPlanner::build(calories, &options)?,
                (None, None) => anyhow::bail!("either --calories or --survey is required"),
            };

            if cli.json {
                return print_json(&plan);
            }
            print_grocery_plan(&plan);
        }

        Commands::Goal { action } => {
            let mut engine = open_engine(&config)?;
            match action {
                GoalCommands::Create {
                    start,
                    target,
                    weigh_in,
                    survey,
                } => {
                    let goal = engine.create_goal(&NewWeightGoal {
                        start_weight_kg: start,
                        target_weight_kg: target,
                        weigh_in_days: weigh_in,
                        survey_id: survey,
                    })?;
                    if cli.json {
                        return print_json(&goal);
                    }
                    println!(
                        "{} {}",
                        "✓ Goal created:".green().bold(),
                        goal.id.to_string().cyan()
                    );
                    println!(
                        "  {:.1} kg → {:.1} kg",
                        goal.start_weight_kg, goal.target_weight_kg
                    );
                }

                GoalCommands::Log {
                    goal,
                    weight,
                    water,
                    sleep,
                    notes,
                } => {
                    let outcome = engine.apply_weight_log(
                        &goal,
                        &WeightLogInput {
                            weight_kg: weight,
                            water_liters: water,
                            sleep_hours: sleep,
                            notes,
                        },
                    )?;
                    if cli.json {
                        return print_json(&outcome);
                    }

                    let log = &outcome.log;
                    println!(
                        "{} {}% of goal ({})",
                        "Progress:".bold(),
                        log.progress,
                        paint_status(log.progress_status)
                    );
                    println!(
                        "  Lost {:.1} kg, {:.1} kg to go",
                        log.lost_kg, log.remaining_kg
                    );
                    if let Some(status) = log.hydration_status {
                        println!("  Hydration: {}", paint_status(status));
                    }
                    if let Some(status) = log.sleep_status {
                        println!("  Sleep: {}", paint_status(status));
                    }
                    if let Some(date) = outcome.projected_completion_date {
                        println!("  Projected completion: {}", date);
                    }
                    if let Some(celebration) = &outcome.celebration {
                        println!("{} {}", "🎉".bold(), celebration.message.green().bold());
                    }
                }

                GoalCommands::Show { goal } => {
                    let stored = engine.get_goal(&goal)?;
                    let summary = engine.goal_summary(&goal)?;
                    if cli.json {
                        return print_json(&summary);
                    }

                    let rows = vec![
                        MetricRow {
                            name: "Start",
                            value: format!("{:.1} kg", stored.start_weight_kg),
                        },
                        MetricRow {
                            name: "Target",
                            value: format!("{:.1} kg", stored.target_weight_kg),
                        },
                        MetricRow {
                            name: "Current",
                            value: format!("{:.1} kg", stored.current_weight_kg),
                        },
                        MetricRow {
                            name: "Logs",
                            value: summary.total_logs.to_string(),
                        },
                        MetricRow {
                            name: "Net change",
                            value: format!("{:+.1} kg", summary.net_change_kg),
                        },
                        MetricRow {
                            name: "Lowest weight",
                            value: summary
                                .lowest_weight_kg
                                .map_or("-".to_string(), |w| format!("{:.1} kg", w)),
                        },
                        MetricRow {
                            name: "Longest loss streak",
                            value: summary.longest_loss_streak.to_string(),
                        },
                        MetricRow {
                            name: "Weekly change",
                            value: summary
                                .average_weekly_change_kg
                                .map_or("-".to_string(), |w| format!("{:+.2} kg", w)),
                        },
                    ];
                    println!("{}", Table::new(rows).with(Style::rounded()));
                    if summary.goal_reached {
                        println!("{}", "✓ Goal reached".green().bold());
                    }
                }
            }
        }

        Commands::Hydration {
            liters,
            date,
            survey,
        } => log_daily(&config, cli.json, DailyLogKind::Hydration, liters, date, survey)?,

        Commands::Sleep {
            hours,
            date,
            survey,
        } => log_daily(&config, cli.json, DailyLogKind::Sleep, hours, date, survey)?,

        Commands::Config { show, init } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);

            if init {
                let mut fresh = AppConfig::default();
                fresh
                    .save_to_file(&path)
                    .with_context(|| format!("Failed to initialize {}", path.display()))?;
                println!("{} {}", "✓ Configuration written to".green(), path.display());
            }
            if show || !init {
                if cli.json {
                    return print_json(&config);
                }
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

/// Engine backed by the SQLite file in the configured data directory
fn open_engine(config: &AppConfig) -> Result<HealthEngine<Database, SystemClock>> {
    std::fs::create_dir_all(&config.settings.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.settings.data_dir.display()
        )
    })?;

    let db_path = config.database_path();
    let db = Database::new(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    Ok(HealthEngine::with_config(db, SystemClock, &config.engine)?)
}

fn log_daily(
    config: &AppConfig,
    json: bool,
    kind: DailyLogKind,
    value: Option<f64>,
    date: Option<NaiveDate>,
    survey_id: Option<Uuid>,
) -> Result<()> {
    let mut engine = open_engine(config)?;

    let logged = match value {
        Some(value) => {
            let input = DailyLogInput {
                value,
                date,
                survey_id,
            };
            Some(match kind {
                DailyLogKind::Hydration => engine.log_hydration(&input)?,
                DailyLogKind::Sleep => engine.log_sleep(&input)?,
            })
        }
        None => None,
    };
    let summary = engine.adherence_summary(kind)?;

    if json {
        #[derive(Serialize)]
        struct Report<'a, L: Serialize, S: Serialize> {
            kind: &'a str,
            log: Option<L>,
            summary: S,
        }
        return print_json(&Report {
            kind: kind.as_str(),
            log: logged,
            summary,
        });
    }

    if let Some(log) = &logged {
        println!(
            "{} {} of {} ({}% - {})",
            format!("{} {}:", "✓".green(), kind.as_str()).bold(),
            log.value,
            log.target,
            log.percentage,
            paint_status(log.status)
        );
    }

    let rows = vec![
        MetricRow {
            name: "Days logged",
            value: summary.days_logged.to_string(),
        },
        MetricRow {
            name: "Green / yellow / red",
            value: format!(
                "{} / {} / {}",
                summary.green_days, summary.yellow_days, summary.red_days
            ),
        },
        MetricRow {
            name: "Average",
            value: format!("{:.1}%", summary.average_percentage),
        },
        MetricRow {
            name: "Green streak",
            value: summary.current_green_streak.to_string(),
        },
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn paint_status(status: Status) -> ColoredString {
    let text = format!("{} - {}", status, status.label());
    match status {
        Status::Green => text.green(),
        Status::Yellow => text.yellow(),
        Status::Red => text.red(),
    }
}

fn paint_level(level: Level) -> ColoredString {
    match level {
        Level::Excellent => level.as_str().green().bold(),
        Level::Good => level.as_str().green(),
        Level::Fair => level.as_str().yellow(),
        Level::Poor => level.as_str().red(),
    }
}

fn print_classification(label: &str, classification: &Classification) {
    println!(
        "{} {}% ({})",
        format!("{}:", label).bold(),
        classification.percentage,
        paint_status(classification.status)
    );
}

fn print_metrics(metrics: &Metrics) {
    let rows = vec![
        MetricRow {
            name: "BMI",
            value: format!("{:.1} ({})", metrics.bmi, metrics.bmi_category),
        },
        MetricRow {
            name: "Body fat",
            value: format!("{:.1}%", metrics.body_fat_percentage),
        },
        MetricRow {
            name: "BMR",
            value: format!("{:.0} kcal", metrics.bmr),
        },
        MetricRow {
            name: "TDEE",
            value: format!("{:.0} kcal", metrics.tdee),
        },
        MetricRow {
            name: "Daily calories",
            value: format!("{:.0} kcal", metrics.daily_calories),
        },
        MetricRow {
            name: "Daily deficit",
            value: format!("{:.0} kcal", metrics.daily_deficit),
        },
        MetricRow {
            name: "Water target",
            value: format!("{:.2} L", metrics.water_target_liters),
        },
        MetricRow {
            name: "Sleep target",
            value: format!("{:.1} h", metrics.sleep_target_hours),
        },
        MetricRow {
            name: "Days to goal",
            value: metrics
                .estimated_days_to_goal
                .map_or("-".to_string(), |d| d.to_string()),
        },
        MetricRow {
            name: "Weekly rate",
            value: format!("{:.2} kg ({})", metrics.weekly_rate_kg, metrics.weight_loss_pace),
        },
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_grocery_plan(plan: &GroceryPlan) {
    println!(
        "{} {:.0} kcal/week ({:.0} kcal/day)",
        "Grocery plan:".bold(),
        plan.weekly_calories,
        plan.target_daily_calories
    );
    println!(
        "  Carbs {:.0} g · Protein {:.0} g · Fat {:.0} g",
        plan.weekly_macros.carbs_grams, plan.weekly_macros.protein_grams, plan.weekly_macros.fat_grams
    );

    let rows: Vec<GroceryRow> = Category::all()
        .iter()
        .flat_map(|category| {
            plan.items.category(*category).iter().map(move |item| GroceryRow {
                category: category.to_string(),
                item: item.name.clone(),
                grams: item.grams,
            })
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    if let Some(optimization) = &plan.optimization {
        println!(
            "{} ${} - ${} per week ({})",
            "Estimated cost:".bold(),
            optimization.weekly_cost.low,
            optimization.weekly_cost.high,
            optimization.price_mode
        );
        for tip in &optimization.tips {
            println!("  • {}", tip);
        }
        for substitution in &optimization.substitutions {
            println!(
                "  {} → {} ({})",
                substitution.ingredient.yellow(),
                substitution.alternatives.join(", "),
                substitution.reason.dimmed()
            );
        }
        if !optimization.unmatched_allergies.is_empty() {
            println!(
                "{} {}",
                "No substitutions known for:".yellow(),
                optimization.unmatched_allergies.join(", ")
            );
        }
    }
}
