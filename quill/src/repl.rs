use anyhow::{anyhow, bail, Context};
use quill_api::AvatarImage;
use quill_domain::{
    CommentThread, FeaturedSplit, LikeStatus, LoginForm, PasswordResetForm, PasswordResetRequestForm, Post,
    PostDraft, RegisterForm,
};
use quill_service::{
    CommentService, FeedController, FeedPhase, FeedView, LikeService, PasswordService, PostService,
    ServiceError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::app::App;

const HELP: &str = "\
Browsing:
  feed                         show the current list
  search <text>                search titles and content
  author <id|->                filter by author, '-' clears
  tag <name|->                 filter by tag, '-' clears
  reset                        clear all filters
  more                         load the next page
  post <id>                    open a post with its comments
  comments                     reload the open post's comments
  user <id>                    show a profile and their posts
  user-more                    next page of the profile's posts
Interacting (requires login):
  like                         like or unlike the open post
  comment <text>               comment on the open post
  reply <comment-id> <text>    reply to a comment
  write <title> | <tags> | <content>
  edit <title> | <tags> | <content>   empty parts keep the current value
  delete                       delete the open post
  profile <name> [| <bio>]     update your profile
  avatar <png-file>            upload a new avatar
Account:
  login <email> <password>
  register <name> <email> <password> <confirm>
  forgot <email>               request a password reset link
  reset-password <token> <new-password>
  logout
  whoami
  help
  quit";

/// 终端前端支持的命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Feed,
    Search(String),
    Author(Option<String>),
    Tag(Option<String>),
    Reset,
    More,
    Post(String),
    Comments,
    User(String),
    UserMore,
    Like,
    Comment(String),
    Reply { parent_id: String, content: String },
    Write(PostDraft),
    Edit(DraftEdit),
    Delete,
    Profile { name: String, bio: Option<String> },
    Avatar(String),
    Login { email: String, password: String },
    Register { name: String, email: String, password: String, confirm: String },
    Forgot(String),
    ResetPassword { token: String, new_password: String },
    Logout,
    WhoAmI,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let words: Vec<&str> = rest.split_whitespace().collect();

        let command = match name {
            "help" | "?" => Command::Help,
            "feed" => Command::Feed,
            "search" => Command::Search(rest.to_string()),
            "author" => Command::Author(optional(rest)),
            "tag" => Command::Tag(optional(rest)),
            "reset" => Command::Reset,
            "more" => Command::More,
            "post" => Command::Post(required(rest, "post <id>")?),
            "comments" => Command::Comments,
            "user" => Command::User(required(rest, "user <id>")?),
            "user-more" => Command::UserMore,
            "like" => Command::Like,
            "comment" => Command::Comment(required(rest, "comment <text>")?),
            "reply" => match rest.split_once(char::is_whitespace) {
                Some((parent_id, content)) => Command::Reply {
                    parent_id: parent_id.to_string(),
                    content: content.trim().to_string(),
                },
                None => return Err("usage: reply <comment-id> <text>".to_string()),
            },
            "write" => Command::Write(parse_draft(rest)?),
            "edit" => Command::Edit(parse_edit(rest)?),
            "delete" => Command::Delete,
            "profile" => {
                let (name, bio) = match rest.split_once('|') {
                    Some((name, bio)) => (name.trim(), Some(bio.trim().to_string())),
                    None => (rest, None),
                };
                Command::Profile {
                    name: required(name, "profile <name> [| <bio>]")?,
                    bio,
                }
            }
            "avatar" => Command::Avatar(required(rest, "avatar <png-file>")?),
            "login" => match words.as_slice() {
                [email, password] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err("usage: login <email> <password>".to_string()),
            },
            "register" => match words.as_slice() {
                [name, email, password, confirm] => Command::Register {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    confirm: confirm.to_string(),
                },
                _ => return Err("usage: register <name> <email> <password> <confirm>".to_string()),
            },
            "forgot" => Command::Forgot(required(rest, "forgot <email>")?),
            "reset-password" => match words.as_slice() {
                [token, new_password] => Command::ResetPassword {
                    token: token.to_string(),
                    new_password: new_password.to_string(),
                },
                _ => return Err("usage: reset-password <token> <new-password>".to_string()),
            },
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}', type 'help'", other)),
        };
        Ok(command)
    }
}

fn optional(value: &str) -> Option<String> {
    match value {
        "" | "-" => None,
        v => Some(v.to_string()),
    }
}

fn required(value: &str, usage: &str) -> Result<String, String> {
    if value.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(value.to_string())
    }
}

/// `edit` 的参数，为空的部分保留文章原来的值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftEdit {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub content: Option<String>,
}

impl DraftEdit {
    fn apply(self, mut draft: PostDraft) -> PostDraft {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(tags) = self.tags {
            draft.tags.clear();
            for tag in &tags {
                draft.add_tag(tag);
            }
        }
        if let Some(content) = self.content {
            draft.content = content;
        }
        draft
    }
}

fn parse_edit(rest: &str) -> Result<DraftEdit, String> {
    let mut parts = rest.splitn(3, '|').map(str::trim);
    let mut next = || parts.next().and_then(optional);
    let edit = DraftEdit {
        title: next(),
        tags: next().map(|tags| tags.split(',').map(|t| t.trim().to_string()).collect()),
        content: next(),
    };
    if edit == DraftEdit::default() {
        return Err("usage: edit <title> | <tag,tag> | <content>".to_string());
    }
    Ok(edit)
}

/// `<title> | <tag,tag> | <content>`，以命令行创建的文章直接发布
fn parse_draft(rest: &str) -> Result<PostDraft, String> {
    let parts: Vec<&str> = rest.splitn(3, '|').map(str::trim).collect();
    let [title, tags, content] = parts.as_slice() else {
        return Err("usage: write <title> | <tag,tag> | <content>".to_string());
    };
    let mut draft = PostDraft {
        title: title.to_string(),
        content: content.to_string(),
        published: true,
        ..Default::default()
    };
    for tag in tags.split(',') {
        draft.add_tag(tag);
    }
    Ok(draft)
}

/// 当前打开的文章
struct OpenPost {
    post: Post,
    like: LikeStatus,
    thread: CommentThread,
}

struct Repl<'a> {
    app: &'a App,
    feed: FeedController,
    open: Option<OpenPost>,
}

/// 逐行读取标准输入并执行命令，直到 quit 或输入结束
pub async fn run(app: &App) -> anyhow::Result<()> {
    let feed = app.home_feed().await;
    let mut repl = Repl {
        app,
        feed,
        open: None,
    };

    match app.auth.current_user() {
        Some(user) => println!("Welcome back, {}.", user.name),
        None => println!("Browsing anonymously. Type 'help' for commands."),
    }
    repl.show_feed().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        debug!("Running {:?}", command);
        if let Err(e) = repl.execute(command).await {
            println!("{}", describe(&e));
        }
    }
    Ok(())
}

/// 服务错误显示其面向用户的消息，其余显示完整的错误链
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ServiceError>() {
        Some(service) => service.user_message(),
        None => format!("{:#}", err),
    }
}

impl<'a> Repl<'a> {
    async fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        let app = self.app;
        match command {
            Command::Help => println!("{}", HELP),
            Command::Feed => self.show_feed().await,
            Command::Search(text) => {
                self.feed.on_search_input(text).await;
                // 终端里一次只输入一行，等静默期过去且请求结束再显示结果
                self.wait_for_feed().await;
                self.show_feed().await;
            }
            Command::Author(author_id) => {
                self.feed.select_author(author_id).await;
                self.show_feed().await;
            }
            Command::Tag(tag) => {
                self.feed.select_tag(tag).await;
                self.show_feed().await;
            }
            Command::Reset => {
                self.feed.reset_filters().await;
                self.show_feed().await;
            }
            Command::More => {
                if !self.feed.load_more().await {
                    println!("No more posts.");
                }
                self.show_feed().await;
            }
            Command::Post(id) => self.open_post(&id).await?,
            Command::Comments => {
                let open = self.open_mut()?;
                open.thread = app.comments.load(&open.post.id).await?;
                print_thread(&open.thread);
            }
            Command::User(id) => self.show_user(&id).await?,
            Command::UserMore => {
                if !app.author_posts.fetch_more().await {
                    println!("No more posts.");
                }
                let state = app.author_posts.state().await;
                print_posts(&state.posts);
            }
            Command::Like => {
                let open = self.open_mut()?;
                let next = app.likes.toggle(&open.post.id, open.like).await?;
                open.like = next;
                println!("{} ({} likes)", if next.liked { "Liked" } else { "Unliked" }, next.count);
            }
            Command::Comment(text) => {
                let open = self.open_mut()?;
                if let Some(comment) = app.comments.add(&open.post.id, &mut open.thread, &text).await? {
                    println!("Comment {} posted.", comment.id);
                }
            }
            Command::Reply { parent_id, content } => {
                let open = self.open_mut()?;
                if let Some(reply) = app
                    .comments
                    .reply(&open.post.id, &mut open.thread, &parent_id, &content)
                    .await?
                {
                    println!("Reply {} posted.", reply.id);
                }
            }
            Command::Write(draft) => {
                let post = app.posts.create(&draft).await?;
                println!("Published {} ({}).", post.title, post.id);
            }
            Command::Edit(edit) => {
                let open = self.open_mut()?;
                let draft = edit.apply(open.post.to_draft());
                let updated = app.posts.update(&open.post, &draft).await?;
                println!("Updated {}.", updated.id);
                open.post = updated;
            }
            Command::Delete => {
                let open = self.open.take().ok_or_else(|| anyhow!("Open a post first with 'post <id>'."))?;
                if let Err(e) = app.posts.delete(&open.post).await {
                    self.open = Some(open);
                    return Err(e.into());
                }
                println!("Deleted {}.", open.post.id);
            }
            Command::Profile { name, bio } => {
                let user = self.current_user()?;
                let mut form = user.to_profile_form();
                form.name = name;
                if bio.is_some() {
                    form.bio = bio;
                }
                let updated = app.auth.update_profile(&user.id, form, None).await?;
                println!("Profile saved for {}.", updated.name);
            }
            Command::Avatar(path) => {
                let user = self.current_user()?;
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Could not read {}", path))?;
                let updated = app
                    .auth
                    .update_profile(&user.id, user.to_profile_form(), Some(AvatarImage::png(bytes)))
                    .await?;
                println!("Avatar updated: {}", updated.avatar_url);
            }
            Command::Login { email, password } => {
                let user = app.auth.login(&LoginForm { email, password }).await?;
                println!("Logged in as {}.", user.name);
            }
            Command::Register { name, email, password, confirm } => {
                let form = RegisterForm {
                    name,
                    email,
                    password,
                    confirm_password: confirm,
                };
                let user = app.auth.register(&form).await?;
                println!("Welcome, {}.", user.name);
            }
            Command::Forgot(email) => {
                let message = app
                    .passwords
                    .request_reset(&PasswordResetRequestForm { email })
                    .await?;
                println!("{}", message);
            }
            Command::ResetPassword { token, new_password } => {
                app.passwords
                    .reset(&PasswordResetForm { new_password, token })
                    .await?;
                println!("Password updated. You can log in now.");
            }
            Command::Logout => {
                app.auth.logout();
                app.cache.invalidate_all();
                println!("Logged out.");
            }
            Command::WhoAmI => match app.auth.refresh_current_user().await? {
                Some(user) => println!("{} <{}> [{}]", user.name, user.email, user.initials()),
                None => println!("Not logged in."),
            },
            Command::Quit => {}
        }
        Ok(())
    }

    fn open_mut(&mut self) -> anyhow::Result<&mut OpenPost> {
        self.open
            .as_mut()
            .ok_or_else(|| anyhow!("Open a post first with 'post <id>'."))
    }

    fn current_user(&self) -> anyhow::Result<quill_domain::User> {
        match self.app.auth.current_user() {
            Some(user) => Ok(user),
            None => bail!(ServiceError::auth_required("edit your profile")),
        }
    }

    /// 等待待发的搜索触发并且请求结束，最多等静默期加一次请求超时
    async fn wait_for_feed(&self) {
        let config = &self.app.config;
        let deadline = tokio::time::Instant::now() + config.feed.search_debounce() + config.api.timeout();
        while matches!(self.feed.view().await.phase, FeedPhase::Pending | FeedPhase::Loading) {
            if tokio::time::Instant::now() >= deadline {
                warn!("Gave up waiting for search results");
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }

    async fn show_feed(&self) {
        let view = self.feed.view().await;
        print_feed(&view);
    }

    async fn open_post(&mut self, id: &str) -> anyhow::Result<()> {
        let state = self.app.post.refresh(id.to_string()).await;
        let Some(post) = state.data else {
            match state.error {
                Some(error) => bail!(error),
                None => bail!("Post not found."),
            }
        };

        let author = match self.app.user.refresh(post.author_id.clone()).await.data {
            Some(user) => user.name,
            None => post.author_id.clone(),
        };
        let like = self.app.likes.status(&post).await;
        let thread = self.app.comments.load(&post.id).await?;

        println!("{}\nby {} on {}", post.title, author, post.created_at.format("%Y-%m-%d"));
        if !post.tags.is_empty() {
            println!("tags: {}", post.tags.join(", "));
        }
        println!("\n{}\n", post.content);
        println!("{} likes{}", like.count, if like.liked { " (you liked this)" } else { "" });
        print_thread(&thread);

        self.open = Some(OpenPost { post, like, thread });
        Ok(())
    }

    async fn show_user(&self, id: &str) -> anyhow::Result<()> {
        let state = self.app.user.refresh(id.to_string()).await;
        let user = state
            .data
            .ok_or_else(|| anyhow!(state.error.unwrap_or_else(|| "User not found.".to_string())))?;

        // 自己的主页包含草稿
        let own = self
            .app
            .auth
            .current_user()
            .is_some_and(|current| current.id == user.id);
        let published = if own { None } else { Some(true) };
        let posts = self.app.author_posts.refresh(&user.id, published).await;

        println!("{} [{}]", user.name, user.initials());
        if !user.bio.is_empty() {
            println!("{}", user.bio);
        }
        print_posts(&posts.posts);
        if let Some(error) = posts.error {
            println!("{}", error);
        }
        Ok(())
    }
}

fn print_feed(view: &FeedView) {
    let title = if view.is_filtered { "Filtered posts" } else { "Latest posts" };
    println!("== {} ==", title);
    match view.phase {
        FeedPhase::Pending => println!("(waiting for you to finish typing)"),
        FeedPhase::Loading => println!("(loading)"),
        FeedPhase::Error => {
            if let Some(error) = &view.error {
                println!("Error: {}", error);
            }
        }
        FeedPhase::Idle => {}
    }
    if view.is_filtered {
        print_posts(&view.posts);
    } else {
        let split = FeaturedSplit::from_posts(&view.posts);
        if let Some(featured) = &split.featured {
            println!("Featured: {} ({})", featured.title, featured.id);
        }
        print_posts(&split.recent);
    }
    if view.can_load_more() {
        println!("(type 'more' for older posts)");
    }
}

fn print_thread(thread: &CommentThread) {
    println!("{} comments", thread.len());
    for (depth, comment) in thread.walk() {
        println!("{}[{}] {}", "  ".repeat(depth + 1), comment.id, comment.content);
    }
}

fn print_posts(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts found.");
        return;
    }
    for post in posts {
        let draft = if post.published { "" } else { " [draft]" };
        let tags: Vec<String> = post.tags.iter().map(|t| format!("#{}", t)).collect();
        println!("  {}  {}{}  {}", post.id, post.title, draft, tags.join(" "));
    }
}
