//! Plain-text output, one `key=value | ...` line per record.

use chrono::{DateTime, Utc};
use epiccrm_core::Action;
use epiccrm_workflow::{Client, Contract, Employee, Event};

use crate::args::DATETIME_FORMAT;

fn when(at: DateTime<Utc>) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn listing<T>(title: &str, rows: &[T], line: impl Fn(&T) -> String) -> String {
    if rows.is_empty() {
        return format!("No {title} found.");
    }
    let mut out = format!("{} {title}:", rows.len());
    for row in rows {
        out.push_str("\n- ");
        out.push_str(&line(row));
    }
    out
}

/// `0601020304` becomes `+33 6 01 02 03 04`; anything else is shown unchanged.
pub fn format_phone_fr(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    match digits.strip_prefix('0') {
        Some(national) if digits.len() == 10 => {
            let (lead, rest) = national.split_at(1);
            let mut out = format!("+33 {lead}");
            for pair in rest.as_bytes().chunks(2) {
                out.push(' ');
                out.push_str(&String::from_utf8_lossy(pair));
            }
            out
        }
        _ => phone.to_string(),
    }
}

pub fn employee(e: &Employee) -> String {
    format!(
        "id={} | name={} | email={} | role={} | active={} | created_at={}",
        e.id,
        e.full_name(),
        e.email,
        e.role,
        e.is_active,
        when(e.created_at)
    )
}

pub fn employees(rows: &[Employee]) -> String {
    listing("employees", rows, employee)
}

pub fn client(c: &Client) -> String {
    format!(
        "id={} | name={} | email={} | phone={} | company={} | sales_contact_id={} | updated_at={}",
        c.id,
        c.full_name(),
        c.email,
        or_dash(c.phone.as_deref().map(format_phone_fr)),
        or_dash(c.company_name.as_deref()),
        c.sales_contact_id,
        when(c.updated_at)
    )
}

pub fn clients(rows: &[Client]) -> String {
    listing("clients", rows, client)
}

pub fn contract(c: &Contract) -> String {
    format!(
        "id={} | client_id={} | sales_contact_id={} | total={} | due={} | signed={} | updated_at={}",
        c.id,
        c.client_id,
        c.sales_contact_id,
        c.total_amount,
        c.amount_due,
        c.is_signed,
        when(c.updated_at)
    )
}

pub fn contracts(rows: &[Contract]) -> String {
    listing("contracts", rows, contract)
}

pub fn event(e: &Event) -> String {
    format!(
        "id={} | contract_id={} | client_id={} | support_contact_id={} | start={} | end={} | location={} | attendees={} | notes={}",
        e.id,
        e.contract_id,
        e.client_id,
        or_dash(e.support_contact_id),
        when(e.start_date),
        when(e.end_date),
        e.location,
        e.attendees,
        or_dash(e.notes.as_deref())
    )
}

pub fn events(rows: &[Event]) -> String {
    listing("events", rows, event)
}

pub fn whoami(e: &Employee, actions: &[Action]) -> String {
    let allowed: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
    format!(
        "{} (email={}, role={})\nallowed: {}",
        e.full_name(),
        e.email,
        e.role,
        allowed.join(", ")
    )
}

pub fn logged_in(e: &Employee, access_ttl_minutes: i64) -> String {
    format!(
        "Logged in as {} (role={}).\nAccess token valid for {access_ttl_minutes} minutes; run `refresh-token` when it expires.",
        e.full_name(),
        e.role
    )
}
