//! One invocation: the collaborators a command needs, and the dispatch from
//! parsed arguments to workflow guards.

use chrono::{DateTime, Utc};
use epiccrm_auth::{Argon2Passwords, ConfigError, SessionManager, TokenStore, actions_for};
use epiccrm_core::DomainResult;
use epiccrm_infra::{AppConfig, FileTokenStore};
use epiccrm_workflow::client::{self, ClientFilter, CreateClient, ReassignClient, UpdateClient};
use epiccrm_workflow::contract::{
    self, ContractFilter, CreateContract, ReassignContract, SignContract, UpdateContract,
};
use epiccrm_workflow::employee::{
    self, CreateEmployee, DeactivateEmployee, HardDeleteEmployee, ReactivateEmployee,
};
use epiccrm_workflow::event::{
    self, AssignSupport, CreateEvent, EventFilter, UnassignSupport, UpdateEvent,
};
use epiccrm_workflow::{Employee, IdentityResolver, InMemoryStore, login, logout, refresh};

use crate::args::{ClientsCommand, Command, ContractsCommand, EmployeesCommand, EventsCommand};
use crate::render;

pub struct App<T = FileTokenStore> {
    store: InMemoryStore,
    sessions: SessionManager,
    tokens: T,
    passwords: Argon2Passwords,
    access_ttl_minutes: i64,
}

impl App<FileTokenStore> {
    pub fn open(config: &AppConfig, store: InMemoryStore) -> Result<Self, ConfigError> {
        Self::with_tokens(config, store, FileTokenStore::new(config.tokens_path()))
    }
}

impl<T: TokenStore> App<T> {
    pub fn with_tokens(
        config: &AppConfig,
        store: InMemoryStore,
        tokens: T,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            sessions: SessionManager::new(&config.session)?,
            tokens,
            passwords: Argon2Passwords::default(),
            access_ttl_minutes: config.session.access_ttl_minutes,
        })
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    fn current(&self) -> DomainResult<Employee> {
        IdentityResolver::new(&self.sessions, &self.tokens, &self.store).resolve_current_employee()
    }

    /// Run one command and render its result. Nothing is persisted here.
    pub fn execute(&self, command: Command) -> DomainResult<String> {
        let now = Utc::now();
        match command {
            Command::Login { email, password } => {
                let employee = login(
                    &self.store,
                    &self.passwords,
                    &self.sessions,
                    &self.tokens,
                    &email,
                    password.as_deref().unwrap_or_default(),
                )?;
                Ok(render::logged_in(&employee, self.access_ttl_minutes))
            }
            Command::Logout => {
                logout(&self.tokens)?;
                Ok("Logged out.".to_string())
            }
            Command::RefreshToken { rotate, no_rotate } => {
                let rotate = Command::rotation(rotate, no_rotate)
                    .unwrap_or_else(|| self.sessions.rotate_on_refresh());
                refresh(&self.sessions, &self.tokens, rotate)?;
                Ok(if rotate {
                    "Session refreshed (new refresh token issued).".to_string()
                } else {
                    "Session refreshed.".to_string()
                })
            }
            Command::Whoami => {
                let me = self.current()?;
                Ok(render::whoami(&me, &actions_for(me.role)))
            }
            Command::Employees { command } => self.employees(command, now),
            Command::Clients { command } => self.clients(command, now),
            Command::Contracts { command } => self.contracts(command, now),
            Command::Events { command } => self.events(command, now),
        }
    }

    fn employees(&self, command: EmployeesCommand, now: DateTime<Utc>) -> DomainResult<String> {
        match command {
            EmployeesCommand::Create {
                first_name,
                last_name,
                email,
                role,
                password,
            } => {
                let created = employee::create(
                    &self.store,
                    &self.passwords,
                    || self.current(),
                    CreateEmployee {
                        first_name,
                        last_name,
                        email,
                        role,
                        password: password.unwrap_or_default(),
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Employee created: {}", render::employee(&created)))
            }
            EmployeesCommand::List { role } => {
                let actor = self.current()?;
                Ok(render::employees(&employee::list(&actor, &self.store, role)?))
            }
            EmployeesCommand::Deactivate { employee_id } => {
                let actor = self.current()?;
                let e = employee::deactivate(
                    &actor,
                    &self.store,
                    DeactivateEmployee {
                        employee_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Employee deactivated: {}", render::employee(&e)))
            }
            EmployeesCommand::Reactivate { employee_id } => {
                let actor = self.current()?;
                let e = employee::reactivate(
                    &actor,
                    &self.store,
                    ReactivateEmployee {
                        employee_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Employee reactivated: {}", render::employee(&e)))
            }
            EmployeesCommand::Delete {
                employee_id,
                confirm,
            } => {
                let actor = self.current()?;
                employee::hard_delete(
                    &actor,
                    &self.store,
                    HardDeleteEmployee {
                        employee_id,
                        confirm_id: confirm,
                    },
                )?;
                Ok(format!("Employee {employee_id} deleted."))
            }
        }
    }

    fn clients(&self, command: ClientsCommand, now: DateTime<Utc>) -> DomainResult<String> {
        let actor = self.current()?;
        match command {
            ClientsCommand::List { mine } => Ok(render::clients(&client::list(
                &actor,
                &self.store,
                ClientFilter { mine },
            )?)),
            ClientsCommand::Create {
                first_name,
                last_name,
                email,
                phone,
                company,
            } => {
                let c = client::create(
                    &actor,
                    &self.store,
                    CreateClient {
                        first_name,
                        last_name,
                        email,
                        phone,
                        company_name: company,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Client created: {}", render::client(&c)))
            }
            ClientsCommand::Update { client_id, fields } => {
                let c = client::update(
                    &actor,
                    &self.store,
                    UpdateClient {
                        client_id,
                        first_name: fields.first_name,
                        last_name: fields.last_name,
                        email: fields.email,
                        phone: fields.phone,
                        company_name: fields.company,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Client updated: {}", render::client(&c)))
            }
            ClientsCommand::Reassign {
                client_id,
                sales_contact_id,
            } => {
                let c = client::reassign(
                    &actor,
                    &self.store,
                    ReassignClient {
                        client_id,
                        sales_contact_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Client reassigned: {}", render::client(&c)))
            }
        }
    }

    fn contracts(&self, command: ContractsCommand, now: DateTime<Utc>) -> DomainResult<String> {
        let actor = self.current()?;
        match command {
            ContractsCommand::List { unsigned, unpaid } => Ok(render::contracts(&contract::list(
                &actor,
                &self.store,
                ContractFilter { unsigned, unpaid },
            )?)),
            ContractsCommand::Create {
                client_id,
                total,
                amount_due,
            } => {
                let c = contract::create(
                    &actor,
                    &self.store,
                    CreateContract {
                        client_id,
                        total_amount: total,
                        amount_due,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Contract created: {}", render::contract(&c)))
            }
            ContractsCommand::Update {
                contract_id,
                total,
                amount_due,
            } => {
                let c = contract::update(
                    &actor,
                    &self.store,
                    UpdateContract {
                        contract_id,
                        total_amount: total,
                        amount_due,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Contract updated: {}", render::contract(&c)))
            }
            ContractsCommand::Sign { contract_id } => {
                let c = contract::sign(
                    &actor,
                    &self.store,
                    SignContract {
                        contract_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Contract signed: {}", render::contract(&c)))
            }
            ContractsCommand::Reassign {
                contract_id,
                sales_contact_id,
            } => {
                let c = contract::reassign(
                    &actor,
                    &self.store,
                    ReassignContract {
                        contract_id,
                        sales_contact_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Contract reassigned: {}", render::contract(&c)))
            }
        }
    }

    fn events(&self, command: EventsCommand, now: DateTime<Utc>) -> DomainResult<String> {
        let actor = self.current()?;
        match command {
            EventsCommand::List {
                without_support,
                mine,
            } => Ok(render::events(&event::list(
                &actor,
                &self.store,
                EventFilter {
                    without_support,
                    assigned_to_me: mine,
                },
            )?)),
            EventsCommand::Create {
                client_id,
                contract_id,
                start,
                end,
                location,
                attendees,
                notes,
            } => {
                let e = event::create(
                    &actor,
                    &self.store,
                    CreateEvent {
                        client_id,
                        contract_id,
                        start_date: start,
                        end_date: end,
                        location,
                        attendees,
                        notes,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Event created: {}", render::event(&e)))
            }
            EventsCommand::Update {
                event_id,
                start,
                end,
                location,
                attendees,
                notes,
                support_contact_id,
            } => {
                let e = event::update(
                    &actor,
                    &self.store,
                    UpdateEvent {
                        event_id,
                        start_date: start,
                        end_date: end,
                        location,
                        attendees,
                        notes,
                        support_contact_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Event updated: {}", render::event(&e)))
            }
            EventsCommand::Assign {
                event_id,
                support_contact_id,
            } => {
                let e = event::assign_support(
                    &actor,
                    &self.store,
                    AssignSupport {
                        event_id,
                        support_contact_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Support assigned: {}", render::event(&e)))
            }
            EventsCommand::Unassign { event_id } => {
                let e = event::unassign_support(
                    &actor,
                    &self.store,
                    UnassignSupport {
                        event_id,
                        occurred_at: now,
                    },
                )?;
                Ok(format!("Support removed: {}", render::event(&e)))
            }
        }
    }
}
