use inkpost::application::identity::PostAuthoring;
use inkpost_api_types::Post;

use crate::args::PostsCmd;
use crate::client::{CliError, Ctx, read_content};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List => {
            let posts = ctx.content()?.list_posts().await?;
            print_json(&posts)
        }
        PostsCmd::Get { id } => {
            let post = ctx.content()?.get_post(id).await?;
            print_json(&post)
        }
        PostsCmd::Create {
            title,
            content,
            content_file,
        } => {
            let body = read_content(content, content_file)?;
            create(ctx, &title, &body).await.map(|_| ())
        }
    }
}

pub async fn create(ctx: &Ctx, title: &str, body: &str) -> Result<Post, CliError> {
    let authoring = PostAuthoring::new(ctx.store.clone(), ctx.content()?).with_timeout(ctx.timeout);
    let post = authoring.publish(title, body).await?;
    print_json(&post)?;
    Ok(post)
}
