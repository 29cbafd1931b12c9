//! CLI command implementations

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::auth::{Credentials, Registration, Session};
use crate::cli::{
    confirm, error, format_gate_state, info, print_record, print_resource_table,
    print_session_detail, print_validation_errors, prompt_password, spinner, success, warn,
    OutputFormat, ResourceAction,
};
use crate::config::{self, loader::CONFIG_FILENAME, Config};
use crate::error::Error;
use crate::gate::GateState;
use crate::navigation::{self, MemoryNavigator, Navigator};
use crate::portal::Portal;
use crate::resources::{
    Clinic, Examination, FetchOutcome, ListQuery, Patient, Product, Resource, ResourceKind, Sale,
    UserAccount, Visit,
};

/// Initialize a new clinic.toml configuration file
pub async fn init(api_url: Option<String>) -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    match api_url {
        Some(url) => config::save_config(&Config::default().with_base_url(Some(url)), config_path)?,
        None => fs::write(config_path, config::loader::default_config_content())?,
    }

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Run 'clinic login --email <email>' to start a session");

    Ok(())
}

/// Log in and persist the session
pub async fn login(
    api_url: Option<String>,
    email: &str,
    password: Option<String>,
    super_admin: bool,
) -> Result<()> {
    let surface = navigation::login_surface(super_admin);
    let (portal, _navigator) = boot(api_url, surface).await?;

    let password = match password {
        Some(password) => password,
        None => prompt_password("Password")?,
    };
    let credentials = Credentials::new(email, password);

    let pb = spinner("Signing in...");
    let result = if super_admin {
        portal.auth.login_super_admin(&credentials).await
    } else {
        portal.auth.login(&credentials).await
    };
    pb.finish_and_clear();

    match result {
        Ok(session) => {
            success(&format!(
                "Logged in as {} ({})",
                session.username(),
                session.role()
            ));
            info(&format!("Home: {}", portal.gate.landing_route()));
            Ok(())
        }
        Err(Error::Validation(errors)) => {
            print_validation_errors(&errors);
            Err(Error::Validation(errors).into())
        }
        Err(e) => {
            error(&format!("Login failed: {}", e));
            Err(e.into())
        }
    }
}

/// Register a new account and log into it
pub async fn register(
    api_url: Option<String>,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let (portal, _navigator) = boot(api_url, navigation::REGISTER).await?;

    let password = match password {
        Some(password) => password,
        None => prompt_password("Choose a password")?,
    };
    let registration = Registration::new(username, email, password);

    match portal.auth.register(&registration).await {
        Ok(session) => {
            success(&format!("Registered {}", session.username()));
            Ok(())
        }
        Err(Error::Validation(errors)) => {
            print_validation_errors(&errors);
            Err(Error::Validation(errors).into())
        }
        Err(e) => {
            error(&format!("Registration failed: {}", e));
            Err(e.into())
        }
    }
}

/// Forget the saved session
pub async fn logout(api_url: Option<String>) -> Result<()> {
    let config = load_config(api_url)?;
    let portal = Portal::from_config(config, Arc::new(MemoryNavigator::default()))?;

    let was_logged_in = portal
        .session
        .load_persisted()
        .map(|record| !record.is_empty())
        .unwrap_or(false);
    portal.auth.logout()?;

    if was_logged_in {
        success("Logged out");
    } else {
        info("No session to log out of");
    }
    Ok(())
}

/// Show the logged-in user
pub async fn whoami(api_url: Option<String>, format: OutputFormat) -> Result<()> {
    let (portal, _navigator) = boot(api_url, navigation::ROOT).await?;

    let Some(session) = portal.auth.get_session() else {
        warn("Not logged in");
        return Ok(());
    };

    let session = match portal.auth.refresh_profile().await {
        Ok(session) => session,
        Err(e) if e.is_transient() => {
            warn(&format!("Showing cached profile: {}", e));
            session
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Table => print_session_detail(&session),
        other => print_structured(&SessionSummary::from(&session), other)?,
    }
    Ok(())
}

/// Run the gate for a route and report the outcome
pub async fn open(api_url: Option<String>, route: &str) -> Result<()> {
    let (portal, navigator) = boot(api_url, route).await?;

    let route = if navigation::normalize(route) == navigation::ROOT {
        portal.gate.landing_route()
    } else {
        route
    };

    let state = enter(&portal, &navigator, route).await;
    println!("{} {}", navigation::normalize(route), format_gate_state(&state));

    if state.is_allowed() {
        if let Some(session) = portal.session.session() {
            let screens: Vec<String> = ResourceKind::for_role(session.role())
                .into_iter()
                .filter_map(|kind| kind.page_route(session.role()))
                .collect();
            if !screens.is_empty() {
                info(&format!("Screens: {}", screens.join(", ")));
            }
        }
    }
    Ok(())
}

/// Select the clinic that lists are scoped to
pub async fn use_clinic(api_url: Option<String>, clinic_id: Option<String>) -> Result<()> {
    let (portal, _navigator) = boot(api_url, navigation::ROOT).await?;

    if !portal.session.is_authenticated() {
        error(&Error::NotAuthenticated.to_string());
        return Err(Error::NotAuthenticated.into());
    }

    let session = portal.auth.select_clinic(clinic_id)?;
    match &session.clinic_id {
        Some(clinic) => success(&format!("Using clinic {}", clinic)),
        None => info("No clinic selected"),
    }
    Ok(())
}

/// Run a CRUD action on one of the resource screens
pub async fn resource(api_url: Option<String>, kind: ResourceKind, action: ResourceAction) -> Result<()> {
    match kind {
        ResourceKind::Patients => run_resource::<Patient>(api_url, action).await,
        ResourceKind::Visits => run_resource::<Visit>(api_url, action).await,
        ResourceKind::Examinations => run_resource::<Examination>(api_url, action).await,
        ResourceKind::Sales => run_resource::<Sale>(api_url, action).await,
        ResourceKind::Products => run_resource::<Product>(api_url, action).await,
        ResourceKind::Users => run_resource::<UserAccount>(api_url, action).await,
        ResourceKind::Clinics => run_resource::<Clinic>(api_url, action).await,
    }
}

async fn run_resource<R: Resource>(api_url: Option<String>, action: ResourceAction) -> Result<()> {
    let (portal, navigator) = boot(api_url, navigation::ROOT).await?;

    let route = match portal.session.session() {
        Some(session) => match R::KIND.page_route(session.role()) {
            Some(route) => route,
            None => {
                error(&format!(
                    "The {} screen is not available to the {} role",
                    R::KIND,
                    session.role()
                ));
                return Err(Error::Forbidden(R::KIND.to_string()).into());
            }
        },
        None => format!("/{}", R::KIND.segment()),
    };

    let state = enter(&portal, &navigator, &route).await;
    if !state.is_allowed() {
        return Err(anyhow!("Access denied ({})", state.label()));
    }

    let mut query = ListQuery::new();
    if let ResourceAction::List {
        search,
        clinic,
        role,
        ..
    } = &action
    {
        if let Some(search) = search {
            query = query.search(search.clone());
        }
        if let Some(clinic) = clinic {
            query = query.clinic(clinic.clone());
        }
        if let Some(role) = role {
            query = query.role(*role);
        }
    }

    let screen = portal.list_screen::<R>(query);
    let result = match action {
        ResourceAction::List { format, .. } => {
            let pb = spinner(&format!("Loading {}...", R::KIND));
            let outcome = screen.refresh().await;
            pb.finish_and_clear();

            match outcome {
                Ok(FetchOutcome::Applied) => {
                    let view = screen.view();
                    match format {
                        OutputFormat::Table => print_resource_table(&view.items),
                        other => print_structured(&view.items, other)?,
                    }
                    Ok(())
                }
                Ok(FetchOutcome::Discarded) => Ok(()),
                Err(e) => Err(e),
            }
        }
        ResourceAction::Show { id, format } => match portal.resources::<R>().get(&id).await {
            Ok(item) => {
                match format {
                    OutputFormat::Table => print_record(&item),
                    other => print_structured(&item, other)?,
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        ResourceAction::Create { data } => {
            let draft: R::Draft = parse_draft(&data)?;
            screen.create(&draft).await.map(|created| {
                success(&format!("Created {} {}", R::KIND, created.id()));
            })
        }
        ResourceAction::Update { id, data } => {
            let draft: R::Draft = parse_draft(&data)?;
            screen.update(&id, &draft).await.map(|updated| {
                success(&format!("Updated {} {}", R::KIND, updated.id()));
            })
        }
        ResourceAction::Delete { id, force } => {
            let confirmed = force || confirm(&format!("Delete {} '{}'?", R::KIND, id));
            match screen.delete(&id, confirmed).await {
                Ok(true) => {
                    success(&format!("Deleted {} {}", R::KIND, id));
                    Ok(())
                }
                Ok(false) => {
                    info("Cancelled");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
    };
    if result.is_ok() {
        if let Some(message) = screen.view().error {
            warn(&format!("List not refreshed: {}", message));
        }
    }
    screen.unmount();

    match result {
        Ok(()) => Ok(()),
        Err(Error::Validation(errors)) => {
            print_validation_errors(&errors);
            Err(Error::Validation(errors).into())
        }
        Err(e) => {
            if e.is_auth_failure() {
                report_redirect(&navigator);
            }
            error(&e.to_string());
            Err(e.into())
        }
    }
}

// Helper functions

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSummary<'a> {
    id: &'a str,
    username: &'a str,
    email: &'a str,
    role: String,
    clinic_id: Option<&'a str>,
    super_admin: bool,
}

impl<'a> From<&'a Session> for SessionSummary<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            id: session.user_id(),
            username: session.username(),
            email: &session.user.email,
            role: session.role().to_string(),
            clinic_id: session.clinic_id.as_deref(),
            super_admin: session.elevated,
        }
    }
}

fn load_config(api_url: Option<String>) -> Result<Config> {
    match config::load_config() {
        Ok(config) => Ok(config.with_base_url(api_url)),
        Err(Error::ConfigNotFound) if api_url.is_some() => {
            Ok(Config::default().with_base_url(api_url))
        }
        Err(e) => Err(anyhow!("{}", e)),
    }
}

/// Build the portal and resolve the stored session behind a neutral loader
async fn boot(api_url: Option<String>, start: &str) -> Result<(Portal, Arc<MemoryNavigator>)> {
    let config = load_config(api_url)?;
    let navigator = Arc::new(MemoryNavigator::new(start));
    let portal = Portal::from_config(config, navigator.clone())?;

    let pb = spinner("Checking session...");
    let restored = portal.auth.restore_session().await;
    pb.finish_and_clear();

    if let Err(e) = restored {
        warn(&format!("Could not verify saved session: {}", e));
    }

    Ok((portal, navigator))
}

/// Visit a route through the gate, reporting any redirect
async fn enter(portal: &Portal, navigator: &MemoryNavigator, route: &str) -> GateState {
    navigator.visit(route);
    let mut visit = portal.gate.visit(route);
    let state = visit.resolve().await.clone();

    match &state {
        GateState::DeniedUnauthenticated { redirect } => {
            warn(&format!("Login required, redirected to {}", redirect));
            info("Run 'clinic login --email <email>' first");
        }
        GateState::DeniedWrongRole { redirect } => {
            warn(&format!(
                "Your role cannot open {}, redirected to {}",
                visit.path(),
                redirect
            ));
        }
        GateState::Checking => warn("Session could not be resolved"),
        GateState::Allowed => {}
    }
    state
}

fn report_redirect(navigator: &MemoryNavigator) {
    let location = navigator.location();
    if navigation::is_login_surface(&location) {
        warn(&format!("Session expired, redirected to {}", location));
    }
}

/// Read a draft from inline JSON or `@file`
fn parse_draft<D: serde::de::DeserializeOwned>(data: &str) -> Result<D> {
    let content = match data.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {}: {}", path, e))?,
        None => data.to_string(),
    };
    serde_json::from_str(&content).map_err(|e| anyhow!("Invalid JSON: {}", e))
}

fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Table => {}
    }
    Ok(())
}
