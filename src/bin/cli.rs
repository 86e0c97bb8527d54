use chrono::{Local, NaiveDate};
use fleet_calendar::{
    AvailabilityReport, CalendarEvent, JsonFileStore, Ledger, LedgerConfig, LedgerStore,
    PendingOrder, commit_ledger, load_orders_from_csv, logging,
};
use std::convert::Infallible;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn split_args(input: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err("Unterminated quote".to_string());
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        let pad = widths[ci].saturating_sub(cell.chars().count());
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if len > widths[ci] {
                widths[ci] = len;
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  units                                  Show idle units per type\n  set <unit> <count>                     Set idle count for a unit type\n  book <client> <unit> <YYYY-MM-DD> <days>\n                                         Book a delivery (quote names with spaces)\n  cancel <delivery_id>                   Remove a delivery and its return\n  amend <delivery_id> <days>             Change a delivery's return lead time\n  show                                   Show the calendar\n  days                                   Show per-day delivery/return counts\n  availability [YYYY-MM-DD]              Availability today (or on a date) and tomorrow\n  orders import <csv_path>               Import pending orders (Cliente, Días Retorno)\n  orders show                            List pending orders\n  orders book <n> <unit> <YYYY-MM-DD>    Book pending order number n\n  orders clear                           Discard pending orders\n  check                                  Check delivery/return pairing\n  relink                                 Link returns that lack a delivery id\n  reset confirm                          Wipe units and calendar\n  quit|exit                              Exit"
    );
}

fn print_units(ledger: &Ledger) {
    let rows: Vec<Vec<String>> = ledger
        .pool
        .iter()
        .map(|(name, count)| vec![name.to_string(), count.to_string()])
        .collect();
    println!("{}", render_text_table(&["unit", "available"], &rows));
}

fn print_calendar(ledger: &Ledger) {
    if ledger.calendar.is_empty() {
        println!("Calendar is empty.");
        return;
    }
    for summary in ledger.day_summaries() {
        println!("{} • {}", summary.date, summary.caption());
        for event in ledger.calendar.events_on(summary.date) {
            match event {
                CalendarEvent::Delivery(delivery) => println!(
                    "  [entrega] {} / {} | ships {} → back in {} days (requested {}) id={}",
                    delivery.client,
                    delivery.unit_type,
                    delivery.ship_date,
                    delivery.resolved_return_days(),
                    delivery.requested_return_days,
                    delivery.id
                ),
                CalendarEvent::Return(ret) => println!(
                    "  [retorno] {} for {}",
                    ret.unit_type,
                    ret.linked_delivery_id.as_deref().unwrap_or("?")
                ),
            }
        }
    }
}

fn print_availability(report: &AvailabilityReport) {
    let rows: Vec<Vec<String>> = report
        .units
        .iter()
        .map(|unit| {
            vec![
                unit.unit_type.clone(),
                unit.pool_count.to_string(),
                unit.today.in_transit.to_string(),
                unit.today.loaded.to_string(),
                unit.today.returned.to_string(),
                unit.today.net_available.to_string(),
                unit.tomorrow.net_available.to_string(),
            ]
        })
        .collect();
    println!("Availability as of {}", report.as_of);
    println!(
        "{}",
        render_text_table(
            &["unit", "pool", "in_transit", "loaded", "returned", "net_today", "net_tomorrow"],
            &rows
        )
    );
}

fn print_orders(orders: &[PendingOrder]) {
    if orders.is_empty() {
        println!("No pending orders.");
        return;
    }
    let rows: Vec<Vec<String>> = orders
        .iter()
        .enumerate()
        .map(|(idx, order)| {
            vec![
                (idx + 1).to_string(),
                order.client.clone(),
                order.return_days.to_string(),
            ]
        })
        .collect();
    println!("{}", render_text_table(&["#", "Cliente", "Días Retorno"], &rows));
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

fn report<T: Display, E: Display>(result: Result<T, E>) {
    match result {
        Ok(receipt) => println!("OK: {}", receipt),
        Err(e) => println!("Error: {}", e),
    }
}

fn main() -> ExitCode {
    logging::init(tracing::Level::WARN);

    let config = match LedgerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = JsonFileStore::from_config(&config);
    let mut ledger = match store.load_ledger() {
        Ok(ledger) => ledger.with_rule(config.weekend_rule()),
        Err(e) => {
            println!("Could not load ledger: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut orders = store.load_orders().unwrap_or_default();

    println!("Fleet Calendar (CLI) - type 'help' for commands\n");
    print_units(&ledger);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let args = match split_args(line.trim()) {
            Ok(args) => args,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let Some(cmd) = args.first() else {
            continue;
        };
        let rest: Vec<&str> = args[1..].iter().map(String::as_str).collect();

        match (cmd.as_str(), rest.as_slice()) {
            ("help", _) => print_help(),
            ("quit" | "exit", _) => break,
            ("units", _) => print_units(&ledger),
            ("set", [unit, count]) => match count.parse::<u32>() {
                Ok(count) => match commit_ledger(&store, &mut ledger, |draft| {
                    draft.set_unit_count(*unit, count);
                    Ok::<_, Infallible>(())
                }) {
                    Ok(()) => println!("Set {} to {} available.", unit, count),
                    Err(e) => println!("Error: {}", e),
                },
                Err(_) => println!("Invalid count"),
            },
            ("set", _) => println!("Usage: set <unit> <count>"),
            ("book", [client, unit, date, days]) => {
                let (Some(ship_date), Ok(days)) = (parse_date(date), days.parse::<u32>()) else {
                    println!("Invalid date or days");
                    continue;
                };
                let request = fleet_calendar::BookingRequest::new(*client, *unit, ship_date, days);
                report(commit_ledger(&store, &mut ledger, |draft| draft.book(&request)));
            }
            ("book", _) => println!("Usage: book <client> <unit> <YYYY-MM-DD> <days>"),
            ("cancel", [id]) => report(commit_ledger(&store, &mut ledger, |draft| draft.cancel(id))),
            ("cancel", _) => println!("Usage: cancel <delivery_id>"),
            ("amend", [id, days]) => match days.parse::<u32>() {
                Ok(days) => report(commit_ledger(&store, &mut ledger, |draft| {
                    draft.amend(id, days)
                })),
                Err(_) => println!("Invalid days"),
            },
            ("amend", _) => println!("Usage: amend <delivery_id> <days>"),
            ("show", _) => print_calendar(&ledger),
            ("days", _) => {
                for summary in ledger.day_summaries() {
                    println!("{} • {}", summary.date, summary.caption());
                }
            }
            ("availability", []) => {
                print_availability(&ledger.availability(Local::now().date_naive()))
            }
            ("availability", [date]) => match parse_date(date) {
                Some(date) => print_availability(&ledger.availability(date)),
                None => println!("Invalid date"),
            },
            ("availability", _) => println!("Usage: availability [YYYY-MM-DD]"),
            ("orders", ["import", path]) => match load_orders_from_csv(path) {
                Ok(imported) => match store.save_orders(&imported) {
                    Ok(()) => {
                        println!("Imported {} orders.", imported.len());
                        orders = imported;
                    }
                    Err(e) => println!("Error saving orders: {}", e),
                },
                Err(e) => println!("Error reading orders: {}", e),
            },
            ("orders", ["show"]) => print_orders(&orders),
            ("orders", ["book", n, unit, date]) => {
                let order = n
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| orders.get(idx));
                let (Some(order), Some(ship_date)) = (order, parse_date(date)) else {
                    println!("Invalid order number or date");
                    continue;
                };
                let request = order.to_request(*unit, ship_date);
                report(commit_ledger(&store, &mut ledger, |draft| draft.book(&request)));
            }
            ("orders", ["clear"]) => match store.clear_orders() {
                Ok(()) => {
                    orders.clear();
                    println!("Pending orders cleared.");
                }
                Err(e) => println!("Error clearing orders: {}", e),
            },
            ("orders", _) => println!("Usage: orders import <csv_path> | show | book <n> <unit> <YYYY-MM-DD> | clear"),
            ("check", _) => {
                let issues = ledger.check_integrity();
                if issues.is_empty() {
                    println!("Calendar is consistent.");
                }
                for issue in issues {
                    println!("- {}", issue);
                }
            }
            ("relink", _) => {
                let summary = match commit_ledger(&store, &mut ledger, |draft| {
                    Ok::<_, Infallible>(draft.relink_returns())
                }) {
                    Ok(summary) => summary,
                    Err(e) => {
                        println!("Error: {}", e);
                        continue;
                    }
                };
                println!(
                    "Relinked {} returns, {} left unmatched.",
                    summary.relinked,
                    summary.unmatched.len()
                );
                for key in summary.unmatched {
                    println!("- could not link return {}", key);
                }
            }
            ("reset", ["confirm"]) => match store.reset(Local::now().date_naive()) {
                Ok(fresh) => {
                    ledger = fresh.with_rule(config.weekend_rule());
                    orders.clear();
                    println!("Units and calendar reset.");
                    print_units(&ledger);
                }
                Err(e) => println!("Error resetting data: {}", e),
            },
            ("reset", _) => println!("This wipes all bookings. Type 'reset confirm' to proceed."),
            (other, _) => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }
    ExitCode::SUCCESS
}
