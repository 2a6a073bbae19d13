use chrono::NaiveDate;

use crate::{
    currency::{format_amount, CurrencyCode},
    errors::PlanError,
    goals::{
        time_interval::{first_of_month, month_label},
        FrequencyUnit, GoalDefinition, GrowthRule, Recurrence,
    },
    utils::build_info,
};

use super::{
    context::{CommandError, CommandResult, ShellContext},
    output,
    registry::{CommandEntry, CommandRegistry},
    table::{Table, TableColumn},
};

const GOAL_USAGE: &str = "goal <add|list|show|saved|remove> ...";
const GOAL_ADD_USAGE: &str = "goal add <name> <amount> <currency> <YYYY-MM-DD> [--saved X] \
[--category C] [--every N month|year] [--until YYYY-MM-DD] [--growth none|fixed|percent|annual V]";
const KEY_PREVIEW: usize = 8;

pub fn build_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(CommandEntry::new(
        "help",
        "Show available commands",
        "help [command]",
        cmd_help,
    ));
    registry.register(CommandEntry::new(
        "goal",
        "Manage savings goals",
        GOAL_USAGE,
        cmd_goal,
    ));
    registry.register(CommandEntry::new(
        "pool",
        "Show or set the savings pool shared by all goals",
        "pool [amount]",
        cmd_pool,
    ));
    registry.register(CommandEntry::new(
        "categories",
        "List goal categories",
        "categories",
        cmd_categories,
    ));
    registry.register(CommandEntry::new(
        "plan",
        "Compute the monthly savings plan",
        "plan [YYYY-MM] [--json]",
        cmd_plan,
    ));
    registry.register(CommandEntry::new(
        "config",
        "Show or change settings",
        "config [set <key> <value>]",
        cmd_config,
    ));
    registry.register(CommandEntry::new(
        "backup",
        "Write a snapshot of the goal book",
        "backup [note]",
        cmd_backup,
    ));
    registry.register(CommandEntry::new(
        "backups",
        "List goal book snapshots, newest first",
        "backups",
        cmd_backups,
    ));
    registry.register(CommandEntry::new(
        "restore",
        "Replace the goal book with a snapshot",
        "restore <backup-name>",
        cmd_restore,
    ));
    registry.register(CommandEntry::new(
        "version",
        "Show build information",
        "version",
        cmd_version,
    ));
    registry.register(CommandEntry::new(
        "exit",
        "Leave the shell",
        "exit",
        cmd_exit,
    ));
    registry.alias("quit", "exit");
    registry
}

fn invalid(message: impl Into<String>) -> CommandError {
    CommandError::InvalidArguments(message.into())
}

fn short_key(key: &str) -> &str {
    key.char_indices()
        .nth(KEY_PREVIEW)
        .map(|(index, _)| &key[..index])
        .unwrap_or(key)
}

fn parse_number(value: &str) -> Result<f64, CommandError> {
    value
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| invalid(format!("`{}` is not a number", value)))
}

fn parse_date(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(format!("`{}` is not a date (expected YYYY-MM-DD)", value)))
}

fn parse_month(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| invalid(format!("`{}` is not a month (expected YYYY-MM)", value)))
}

fn option_value<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    flag: &str,
) -> Result<&'a str, CommandError> {
    tokens
        .next()
        .ok_or_else(|| invalid(format!("`{}` needs a value", flag)))
}

/// Builds a goal from `goal add` arguments.
pub(crate) fn parse_goal(args: &[&str]) -> Result<GoalDefinition, CommandError> {
    let mut positional = Vec::new();
    let mut saved = None;
    let mut category = None;
    let mut every = None;
    let mut until = None;
    let mut growth = None;

    let mut tokens = args.iter().copied();
    while let Some(token) = tokens.next() {
        match token {
            "--saved" => saved = Some(parse_number(option_value(&mut tokens, token)?)?),
            "--category" => category = Some(option_value(&mut tokens, token)?.to_string()),
            "--every" => {
                let count_text = option_value(&mut tokens, token)?;
                let count: u32 = count_text
                    .parse()
                    .map_err(|_| invalid(format!("`{}` is not a whole number", count_text)))?;
                let unit_text = option_value(&mut tokens, token)?;
                let unit = FrequencyUnit::parse(unit_text).ok_or_else(|| {
                    invalid(format!("`{}` is not a frequency (month or year)", unit_text))
                })?;
                every = Some((count, unit));
            }
            "--until" => until = Some(parse_date(option_value(&mut tokens, token)?)?),
            "--growth" => {
                let rule_text = option_value(&mut tokens, token)?;
                let rule = GrowthRule::parse(rule_text).ok_or_else(|| {
                    invalid(format!(
                        "`{}` is not a growth rule (none, fixed, percent, annual)",
                        rule_text
                    ))
                })?;
                let value = match rule {
                    GrowthRule::None => None,
                    _ => Some(parse_number(option_value(&mut tokens, token)?)?),
                };
                growth = Some((rule, value));
            }
            flag if flag.starts_with("--") => {
                return Err(invalid(format!("unknown option `{}`", flag)))
            }
            value => positional.push(value),
        }
    }

    let [name, amount, currency, date] = positional.as_slice() else {
        return Err(invalid(format!("usage: {}", GOAL_ADD_USAGE)));
    };
    let mut goal = GoalDefinition::new(
        *name,
        parse_number(amount)?,
        CurrencyCode::new(*currency),
        parse_date(date)?,
    );
    if let Some(saved) = saved {
        goal = goal.with_accumulated(saved);
    }
    if let Some(category) = category {
        goal = goal.with_category(category);
    }
    match every {
        Some((count, unit)) => {
            let mut recurrence = Recurrence::every(count, unit);
            if let Some(end) = until {
                recurrence = recurrence.until(end);
            }
            if let Some((rule, value)) = growth {
                recurrence.growth = rule;
                recurrence.growth_value = value;
            }
            goal = goal.with_recurrence(recurrence);
        }
        None if until.is_some() || growth.is_some() => {
            return Err(invalid("`--until` and `--growth` need `--every`"));
        }
        None => {}
    }
    goal.validate()?;
    Ok(goal)
}

fn describe_recurrence(goal: &GoalDefinition) -> String {
    match &goal.recurrence {
        None => "Once".into(),
        Some(recurrence) => match recurrence.end_date {
            Some(end) => format!("{} until {}", recurrence.interval.label(), end),
            None => recurrence.interval.label(),
        },
    }
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let entry = context
            .registry
            .get(&name.to_lowercase())
            .ok_or_else(|| invalid(format!("unknown command `{}`", name)))?;
        output::info(format!("{} - {}", entry.name, entry.description));
        output::info(format!("usage: {}", entry.usage));
        if entry.name == "goal" {
            output::info(format!("       {}", GOAL_ADD_USAGE));
        }
        return Ok(());
    }

    output::section("Commands");
    let mut table = Table::new(vec![
        TableColumn::left("Command"),
        TableColumn::left("Description"),
    ]);
    for entry in context.registry.list() {
        table.add_row(vec![entry.name, entry.description]);
    }
    output::info(table.render());
    Ok(())
}

fn cmd_goal(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(invalid(format!("usage: {}", GOAL_USAGE)));
    };
    match action.to_lowercase().as_str() {
        "add" => goal_add(context, rest),
        "list" | "ls" => goal_list(context),
        "show" => goal_show(context, rest),
        "saved" => goal_saved(context, rest),
        "remove" | "rm" => goal_remove(context, rest),
        other => Err(invalid(format!(
            "unknown goal action `{}` (expected add, list, show, saved, remove)",
            other
        ))),
    }
}

fn goal_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let goal = parse_goal(args)?;
    let rates = context.config.rate_table()?;
    if !rates.supports(&goal.currency) {
        return Err(PlanError::UnsupportedCurrency(format!(
            "{} (known: {})",
            goal.currency,
            rates.codes().join(", ")
        ))
        .into());
    }
    let added = context.book.add_goal(goal)?;
    let message = format!(
        "Goal `{}` added: {} due {} [{}]",
        added.name,
        format_amount(added.target_amount, &added.currency),
        added.target_date,
        short_key(&added.key)
    );
    context.persist_book()?;
    output::success(message);
    Ok(())
}

fn goal_list(context: &mut ShellContext) -> CommandResult {
    if context.book.goals.is_empty() {
        output::info("No goals yet. Use `goal add` to create one.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Key"),
        TableColumn::left("Name"),
        TableColumn::right("Target"),
        TableColumn::right("Saved"),
        TableColumn::left("Due"),
        TableColumn::left("Repeats"),
        TableColumn::left("Category"),
    ]);
    for goal in &context.book.goals {
        table.add_row(vec![
            short_key(&goal.key).to_string(),
            goal.name.clone(),
            format_amount(goal.target_amount, &goal.currency),
            format_amount(goal.accumulated_amount, &goal.currency),
            goal.target_date.to_string(),
            describe_recurrence(goal),
            goal.category.clone().unwrap_or_default(),
        ]);
    }
    output::info(table.render());
    Ok(())
}

fn goal_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = args
        .first()
        .ok_or_else(|| invalid("usage: goal show <key>"))?;
    let goal = context.book.find_goal(key)?;
    output::section(&goal.name);
    output::info(format!("Key:      {}", goal.key));
    output::info(format!(
        "Target:   {}",
        format_amount(goal.target_amount, &goal.currency)
    ));
    output::info(format!(
        "Saved:    {}",
        format_amount(goal.accumulated_amount, &goal.currency)
    ));
    output::info(format!("Due:      {}", goal.target_date));
    output::info(format!("Repeats:  {}", describe_recurrence(goal)));
    if let Some(recurrence) = goal
        .recurrence
        .as_ref()
        .filter(|recurrence| recurrence.growth != GrowthRule::None)
    {
        output::info(format!(
            "Growth:   {:?} {}",
            recurrence.growth,
            recurrence.growth_value.unwrap_or_default()
        ));
    }
    if let Some(category) = &goal.category {
        output::info(format!("Category: {}", category));
    }
    Ok(())
}

fn goal_saved(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [key, amount] = args else {
        return Err(invalid("usage: goal saved <key> <amount>"));
    };
    let amount = parse_number(amount)?;
    let mut goal = context.book.find_goal(key)?.clone();
    goal.accumulated_amount = amount;
    let message = format!(
        "Goal `{}` now has {} saved",
        goal.name,
        format_amount(amount, &goal.currency)
    );
    context.book.update_goal(goal)?;
    context.persist_book()?;
    output::success(message);
    Ok(())
}

fn goal_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = args
        .first()
        .ok_or_else(|| invalid("usage: goal remove <key>"))?;
    let key = context.book.find_goal(key)?.key.clone();
    let removed = context.book.remove_goal(&key)?;
    context.persist_book()?;
    output::success(format!("Goal `{}` removed", removed.name));
    Ok(())
}

fn cmd_pool(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let base = CurrencyCode::new(&context.config.base_currency);
    match args {
        [] => {
            output::info(format!(
                "Savings pool: {}",
                format_amount(context.book.global_pool, &base)
            ));
            Ok(())
        }
        [amount] => {
            context.book.set_global_pool(parse_number(amount)?)?;
            context.persist_book()?;
            output::success(format!(
                "Savings pool set to {}",
                format_amount(context.book.global_pool, &base)
            ));
            Ok(())
        }
        _ => Err(invalid("usage: pool [amount]")),
    }
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.book.categories.is_empty() {
        output::info("No categories yet. Use `goal add ... --category <name>`.");
        return Ok(());
    }
    for category in &context.book.categories {
        let count = context
            .book
            .goals
            .iter()
            .filter(|goal| goal.category.as_deref() == Some(category.as_str()))
            .count();
        output::info(format!("{} ({} goals)", category, count));
    }
    Ok(())
}

fn cmd_plan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut start = None;
    let mut as_json = false;
    for arg in args {
        match *arg {
            "--json" => as_json = true,
            month => start = Some(parse_month(month)?),
        }
    }
    let start = start.unwrap_or_else(|| first_of_month(context.today()));
    let engine = context.engine()?;
    let report = context.book.plan(&engine, start)?;

    if as_json {
        output::info(serde_json::to_string_pretty(&report).map_err(PlanError::from)?);
        return Ok(());
    }

    for truncated in &report.truncated {
        let name = context
            .book
            .find_goal(&truncated.goal_key)
            .map(|goal| goal.name.as_str())
            .unwrap_or(truncated.goal_key.as_str());
        output::warning(format!(
            "Goal `{}` was cut off after {} occurrences; raise `max_occurrences` to see more.",
            name, truncated.emitted
        ));
    }

    if report.rows.is_empty() {
        output::info(empty_plan_message(start));
        return Ok(());
    }

    let base = engine.rates().base();
    output::section(format!("Savings plan from {}", month_label(start)));
    let mut table = Table::new(vec![
        TableColumn::left("Month"),
        TableColumn::right("Due"),
        TableColumn::right("Cumulative"),
        TableColumn::right("Proposed"),
        TableColumn::right("Required"),
    ]);
    for row in &report.rows {
        table.add_row(vec![
            row.month_label.clone(),
            format_amount(row.expense_amount, base),
            format_amount(row.cumulative_expense, base),
            format_amount(row.proposed_savings, base),
            format_amount(row.required_savings, base),
        ]);
    }
    output::info(table.render());

    if let Some(target) = report.current_target() {
        output::success(format!(
            "Put aside {} per month starting {}.",
            format_amount(target, base),
            month_label(start)
        ));
    }
    if report.pool_applied > 0.0 {
        output::info(format!(
            "Pool applied: {} ({} left over)",
            format_amount(report.pool_applied, base),
            format_amount(report.pool_remaining, base)
        ));
    }
    Ok(())
}

fn empty_plan_message(start: NaiveDate) -> String {
    format!("Nothing to save from {}.", month_label(start))
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let config = &context.config;
            output::section("Configuration");
            output::info(format!("file:                  {}", context.config_manager.path().display()));
            output::info(format!("base_currency:         {}", config.base_currency));
            for (code, rate) in &config.rates {
                output::info(format!("rate.{}:              {}", code, rate));
            }
            output::info(format!("minimum_horizon_years: {}", config.minimum_horizon_years));
            output::info(format!("default_horizon_years: {}", config.default_horizon_years));
            output::info(format!("max_occurrences:       {}", config.max_occurrences));
            Ok(())
        }
        ["set", key, value] => {
            let mut updated = context.config.clone();
            updated.set_value(key, value)?;
            updated.engine()?;
            context.config = updated;
            context.persist_config()?;
            output::success(format!("`{}` set to {}", key, value));
            Ok(())
        }
        _ => Err(invalid("usage: config [set <key> <value>]")),
    }
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let name = context.storage().backup(&context.book, note.as_deref())?;
    output::success(format!("Backup written: {}", name));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.storage().list_backups()?;
    if backups.is_empty() {
        output::info("No backups yet.");
    }
    for name in backups {
        output::info(name);
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name] = args else {
        return Err(invalid("usage: restore <backup-name>"));
    };
    context.book = context.storage().restore(name)?;
    output::success(format!(
        "Restored {} ({} goals)",
        name,
        context.book.goals.len()
    ));
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
