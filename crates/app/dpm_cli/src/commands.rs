use std::collections::BTreeSet;
use std::path::PathBuf;

use dpm_api_client::{Client, ClientConfig};
use dpm_core::display::{
    self, GENERATE_BIND_TOKEN_BUTTON, GENERATE_PASSWORD_BUTTON, GROUP_INPUT, Selectors, flag_mark,
};
use dpm_core::group_context::{GroupContext, GroupRef};
use dpm_core::models::{
    AccessPermissionBody, Application, ApplicationDraft, ApplicationPermission, Group, GroupDraft,
    SearchHit, SearchRequest, SuperUser, SuperUserDraft, Topic, TopicDraft, User, UserDraft,
};
use dpm_core::{EntityKind, SessionContext};
use prettytable::format::consts::FORMAT_CLEAN;
use prettytable::{Table, row};

use crate::cli::{
    AccessArgs, ApplicationCommand, Cli, Commands, GroupCommand, MemberFlags, PermissionCommand,
    ScopedListArgs, SuperUserCommand, TopicCommand, UserCommand,
};
use crate::{Error, Result, token};

/// Commands that talk to the backend share one client and the stored token.
pub struct Context {
    client: Client,
    token_path: PathBuf,
}

impl Context {
    pub async fn open(cli: &Cli) -> Result<Self> {
        let token_path = token::token_path(cli.token_file.as_deref())?;
        let client = Client::new(ClientConfig::new(&cli.url)?, SessionContext::new())?;
        client.set_token(token::load(&token_path)?).await;
        Ok(Self { client, token_path })
    }

    /// A rejected token is stale; forget it.
    pub fn forget_token(&self) -> Result<()> {
        token::remove(&self.token_path)
    }
}

/// Commands that need neither the backend nor a token.
pub fn run_offline(command: &Commands) -> Option<String> {
    let out = match command {
        Commands::Version => format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        Commands::Curl {
            application,
            password,
        } => {
            let mut out = String::new();
            if let (Some(id), Some(password)) = (application, password) {
                out.push_str(&format!(
                    "json='{}'\n",
                    display::application_login_json(*id, password)
                ));
            }
            out.push_str(display::login_curl_command());
            out
        }
        Commands::Selectors => selectors(),
        _ => return None,
    };
    Some(out)
}

/// Borderless, left-aligned columns.
fn render(mut table: Table) -> String {
    table.set_format(*FORMAT_CLEAN);
    table.to_string()
}

fn selectors() -> String {
    let mut table = Table::new();
    table.set_titles(row!["KIND", "ADD", "EDIT", "DELETE", "SAVE", "SEARCH", "TABLE"]);
    for kind in EntityKind::ALL {
        let s = Selectors::for_kind(*kind);
        table.add_row(row![
            kind.singular(),
            s.add,
            s.edit_icon,
            s.delete_icon,
            s.save_button,
            s.search_table,
            s.table
        ]);
    }
    let mut out = render(table);
    for extra in [GROUP_INPUT, GENERATE_BIND_TOKEN_BUTTON, GENERATE_PASSWORD_BUTTON] {
        out.push_str(extra);
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub async fn run_online(ctx: &Context, command: Commands) -> Result<String> {
    let client = &ctx.client;
    match command {
        Commands::Login { username, password } => {
            let profile = client.login(&username, &password).await?;
            if let Some(token) = client.token().await {
                token::store(&ctx.token_path, &token)?;
            }
            Ok(format!("logged in as {}", profile.name))
        }
        Commands::Logout => {
            let result = client.logout().await;
            ctx.forget_token()?;
            if let Err(e) = result {
                log::warn!("backend logout failed: {e}");
            }
            Ok("logged out".into())
        }
        Commands::Whoami => whoami(client).await,
        Commands::Groups(cmd) => groups(client, cmd).await,
        Commands::Users(cmd) => users(client, cmd).await,
        Commands::SuperUsers(cmd) => super_users(client, cmd).await,
        Commands::Topics(cmd) => topics(client, cmd).await,
        Commands::Applications(cmd) => applications(client, cmd).await,
        Commands::Permissions(cmd) => permissions(client, cmd).await,
        Commands::Search {
            query,
            groups,
            topics,
            applications,
        } => {
            let mut kinds = Vec::new();
            if groups {
                kinds.push(EntityKind::Group);
            }
            if topics {
                kinds.push(EntityKind::Topic);
            }
            if applications {
                kinds.push(EntityKind::Application);
            }
            let request = SearchRequest::new(query.as_deref()).only(&kinds);
            Ok(search_table(&client.search(&request).await?))
        }
        Commands::Version | Commands::Curl { .. } | Commands::Selectors => {
            Err(Error::Custom("command does not need the backend".into()))
        }
    }
}

async fn whoami(client: &Client) -> Result<String> {
    if client.token().await.is_none() || client.refresh_session().await?.is_none() {
        return Ok("not logged in".into());
    }
    let state = client.session().state();
    let mut out = format!(
        "{}{}\n",
        state.name.as_deref().unwrap_or_default(),
        if state.admin { " (super user)" } else { "" }
    );

    if !state.permissions_by_group.is_empty() {
        let mut table = Table::new();
        table.set_titles(row!["GROUP", "GROUP ADMIN", "TOPIC ADMIN", "APPLICATION ADMIN"]);
        for p in &state.permissions_by_group {
            table.add_row(row![
                p.group_name,
                flag_mark(p.is_group_admin),
                flag_mark(p.is_topic_admin),
                flag_mark(p.is_application_admin)
            ]);
        }
        out.push_str(&render(table));
    }

    let manageable: Vec<&str> = EntityKind::ALL
        .iter()
        .filter(|k| state.controls(**k, None).edit)
        .map(|k| k.path_segment())
        .collect();
    if !manageable.is_empty() {
        out.push_str(&format!("can manage: {}", manageable.join(", ")));
    }
    Ok(out.trim_end().to_string())
}

/// Walk the group selector the way the `group-input` typeahead does: an id
/// or an exact name wins, otherwise the query must narrow to one group.
async fn select_group(client: &Client, query: &str) -> Result<GroupContext> {
    let groups = client.groups().list(None).await?;
    let mut context = GroupContext::default();
    context.focus()?;
    context.type_query(query)?;

    let by_id = query
        .parse::<i64>()
        .ok()
        .and_then(|id| groups.iter().find(|g| g.id == id));
    let chosen = match by_id {
        Some(group) => group,
        None => {
            let candidates = context.candidates(&groups);
            let exact = candidates
                .iter()
                .find(|g| g.name.eq_ignore_ascii_case(query.trim()));
            match (exact, candidates.as_slice()) {
                (Some(group), _) => *group,
                (None, [only]) => *only,
                (None, []) => return Err(Error::Custom(format!("no group matches '{query}'"))),
                (None, many) => {
                    let names: Vec<&str> = many.iter().map(|g| g.name.as_str()).collect();
                    return Err(Error::Custom(format!(
                        "'{query}' matches several groups: {}",
                        names.join(", ")
                    )));
                }
            }
        }
    };
    context.choose(GroupRef::from(chosen))?;
    Ok(context)
}

async fn group_filter(client: &Client, args: &ScopedListArgs) -> Result<Option<i64>> {
    match &args.group {
        None => Ok(None),
        Some(query) => Ok(select_group(client, query)
            .await?
            .selected()
            .map(|g| g.id)),
    }
}

fn group_table(rows: &[Group]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["ID", "NAME", "PUBLIC", "USERS", "TOPICS", "APPLICATIONS"]);
    for g in rows {
        table.add_row(row![
            g.id,
            g.name,
            flag_mark(g.is_public),
            g.membership_count,
            g.topic_count,
            g.application_count
        ]);
    }
    render(table)
}

fn user_table(rows: &[User]) -> String {
    let mut table = Table::new();
    table.set_titles(row![
        "ID",
        "EMAIL",
        "GROUP",
        "GROUP ADMIN",
        "TOPIC ADMIN",
        "APPLICATION ADMIN"
    ]);
    for u in rows {
        table.add_row(row![
            u.id,
            u.email,
            u.group_name,
            flag_mark(u.is_group_admin),
            flag_mark(u.is_topic_admin),
            flag_mark(u.is_application_admin)
        ]);
    }
    render(table)
}

fn super_user_table(rows: &[SuperUser]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["ID", "EMAIL"]);
    for s in rows {
        table.add_row(row![s.id, s.email]);
    }
    render(table)
}

fn topic_table(rows: &[Topic]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["ID", "NAME", "KIND", "GROUP", "PUBLIC", "CANONICAL NAME"]);
    for t in rows {
        table.add_row(row![
            t.id,
            t.name,
            format!("{:?}", t.kind),
            t.group_name,
            flag_mark(t.is_public),
            t.canonical_name
        ]);
    }
    render(table)
}

fn application_table(rows: &[Application]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["ID", "NAME", "GROUP", "PUBLIC", "UPDATED"]);
    for a in rows {
        table.add_row(row![
            a.id,
            a.name,
            a.group_name,
            flag_mark(a.is_public),
            a.date_updated.format("%Y-%m-%d %H:%M")
        ]);
    }
    render(table)
}

fn partitions(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        "*".into()
    } else {
        names.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }
}

fn permission_table(rows: &[ApplicationPermission]) -> String {
    let mut table = Table::new();
    table.set_titles(row![
        "ID",
        "APPLICATION",
        "TOPIC",
        "READ",
        "WRITE",
        "READ PARTITIONS",
        "WRITE PARTITIONS"
    ]);
    for p in rows {
        table.add_row(row![
            p.id,
            p.application_name,
            p.topic_name,
            flag_mark(p.read),
            flag_mark(p.write),
            partitions(&p.read_partitions),
            partitions(&p.write_partitions)
        ]);
    }
    render(table)
}

fn search_table(hits: &[SearchHit]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["KIND", "ID", "NAME"]);
    for hit in hits {
        table.add_row(row![hit.kind().singular(), hit.id(), hit.name()]);
    }
    render(table)
}

fn deleted(kind: EntityKind, id: i64) -> String {
    format!("deleted {} {id}", kind.singular())
}

async fn groups(client: &Client, cmd: GroupCommand) -> Result<String> {
    let api = client.groups();
    match cmd {
        GroupCommand::List(args) => Ok(group_table(&api.list(args.filter.as_deref()).await?)),
        GroupCommand::Show { id } => Ok(group_table(&[api.show(id).await?])),
        GroupCommand::Create {
            name,
            description,
            public,
        } => {
            let draft = GroupDraft {
                name,
                description,
                is_public: public,
            };
            Ok(group_table(&[api.create(&draft).await?]))
        }
        GroupCommand::Update {
            id,
            name,
            description,
            public,
        } => {
            let draft = GroupDraft {
                name,
                description,
                is_public: public,
            };
            Ok(group_table(&[api.update(id, &draft).await?]))
        }
        GroupCommand::Delete { id } => {
            api.delete(id).await?;
            Ok(deleted(EntityKind::Group, id))
        }
    }
}

fn member_draft(draft: &mut UserDraft, flags: &MemberFlags) {
    draft.is_group_admin = flags.group_admin;
    draft.is_topic_admin = flags.topic_admin;
    draft.is_application_admin = flags.application_admin;
}

async fn users(client: &Client, cmd: UserCommand) -> Result<String> {
    let api = client.users();
    match cmd {
        UserCommand::List(args) => {
            let filter = args.list.filter.as_deref();
            let rows = match group_filter(client, &args).await? {
                Some(group) => api.list_in(group, filter).await?,
                None => api.list(filter).await?,
            };
            Ok(user_table(&rows))
        }
        UserCommand::Show { id } => Ok(user_table(&[api.show(id).await?])),
        UserCommand::Create {
            email,
            group,
            flags,
        } => {
            let context = select_group(client, &group).await?;
            let mut draft = UserDraft::with_email(email);
            member_draft(&mut draft, &flags);
            Ok(user_table(&[api.create_in(&context, &draft).await?]))
        }
        UserCommand::Update { id, flags } => {
            let current = api.show(id).await?;
            let mut draft = UserDraft::from(&current);
            member_draft(&mut draft, &flags);
            Ok(user_table(&[api.update(id, &draft).await?]))
        }
        UserCommand::Delete { id } => {
            api.delete(id).await?;
            Ok(deleted(EntityKind::User, id))
        }
    }
}

async fn super_users(client: &Client, cmd: SuperUserCommand) -> Result<String> {
    let api = client.super_users();
    match cmd {
        SuperUserCommand::List(args) => {
            Ok(super_user_table(&api.list(args.filter.as_deref()).await?))
        }
        SuperUserCommand::Create { email } => {
            let created = api.create(&SuperUserDraft { email }).await?;
            Ok(super_user_table(&[created]))
        }
        SuperUserCommand::Delete { id } => {
            api.delete(id).await?;
            Ok(deleted(EntityKind::SuperUser, id))
        }
    }
}

async fn topics(client: &Client, cmd: TopicCommand) -> Result<String> {
    let api = client.topics();
    match cmd {
        TopicCommand::List(args) => {
            let filter = args.list.filter.as_deref();
            let rows = match group_filter(client, &args).await? {
                Some(group) => api.list_in(group, filter).await?,
                None => api.list(filter).await?,
            };
            Ok(topic_table(&rows))
        }
        TopicCommand::Show { id } => Ok(topic_table(&[api.show(id).await?])),
        TopicCommand::Create {
            name,
            group,
            kind,
            description,
            public,
        } => {
            let context = select_group(client, &group).await?;
            let draft = TopicDraft {
                kind: kind.into(),
                description,
                is_public: public,
                ..TopicDraft::named(name)
            };
            Ok(topic_table(&[api.create_in(&context, &draft).await?]))
        }
        TopicCommand::Delete { id } => {
            api.delete(id).await?;
            Ok(deleted(EntityKind::Topic, id))
        }
        TopicCommand::Kinds => {
            let kinds: Vec<String> = api
                .kinds()
                .await?
                .iter()
                .map(|k| format!("{k:?}"))
                .collect();
            Ok(kinds.join("\n"))
        }
    }
}

async fn applications(client: &Client, cmd: ApplicationCommand) -> Result<String> {
    let api = client.applications();
    match cmd {
        ApplicationCommand::List(args) => {
            let filter = args.list.filter.as_deref();
            let rows = match group_filter(client, &args).await? {
                Some(group) => api.list_in(group, filter).await?,
                None => api.list(filter).await?,
            };
            Ok(application_table(&rows))
        }
        ApplicationCommand::Show { id } => Ok(application_table(&[api.show(id).await?])),
        ApplicationCommand::Create {
            name,
            group,
            description,
            public,
        } => {
            let context = select_group(client, &group).await?;
            let draft = ApplicationDraft {
                description,
                is_public: public,
                ..ApplicationDraft::named(name)
            };
            Ok(application_table(&[api.create_in(&context, &draft).await?]))
        }
        ApplicationCommand::Delete { id } => {
            api.delete(id).await?;
            Ok(deleted(EntityKind::Application, id))
        }
        ApplicationCommand::BindToken { id } => Ok(api.generate_bind_token(id).await?),
        ApplicationCommand::Password { id } => Ok(api.generate_password(id).await?),
    }
}

fn access(args: &AccessArgs) -> AccessPermissionBody {
    AccessPermissionBody {
        read: args.read,
        write: args.write,
        read_partitions: args.read_partitions.iter().cloned().collect(),
        write_partitions: args.write_partitions.iter().cloned().collect(),
    }
}

async fn permissions(client: &Client, cmd: PermissionCommand) -> Result<String> {
    let api = client.application_permissions();
    match cmd {
        PermissionCommand::ByTopic { topic } => {
            Ok(permission_table(&api.by_topic(topic).await?.content))
        }
        PermissionCommand::ByApplication { application } => Ok(permission_table(
            &api.by_application(application).await?.content,
        )),
        PermissionCommand::Add {
            topic,
            bind_token,
            access: args,
        } => {
            let granted = api
                .add_application_to_topic(topic, &bind_token, &access(&args))
                .await?;
            Ok(permission_table(&[granted]))
        }
        PermissionCommand::Update { id, access: args } => {
            Ok(permission_table(&[api.update(id, &access(&args)).await?]))
        }
        PermissionCommand::Remove { id } => {
            api.remove(id).await?;
            Ok(format!("removed permission {id}"))
        }
    }
}
