//! Post feeds, authoring, and the audio narration attachment.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, NewPostView, PostsRepo, RepoError, TagsRepo, UpdatePostParams,
};
use crate::domain::entities::{PostRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::posts::{
    derive_excerpt, normalize_tags, validate_content, validate_title,
};

const FEED_LIMIT: i64 = 20;
const FEATURED_LIMIT: i64 = 6;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DomainError> for PostError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => PostError::Validation(message),
            other => PostError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    /// Comma-separated tag list, the shape the composer submits.
    pub tags: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub id: Uuid,
    pub title: String,
    pub content: String,
}

/// A post assembled for rendering: author, tags, and the viewer's flags.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: PostRecord,
    pub author: UserRecord,
    pub tags: Vec<String>,
    pub liked_by_current_user: bool,
    pub reposted_by_current_user: bool,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    tags: Arc<dyn TagsRepo>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostsRepo>, tags: Arc<dyn TagsRepo>) -> Self {
        Self { posts, tags }
    }

    pub async fn latest(&self, viewer: Option<&UserRecord>) -> Result<Vec<PostView>, PostError> {
        let rows = self.posts.list_latest(FEED_LIMIT).await?;
        self.assemble(rows, viewer).await
    }

    pub async fn featured(&self, viewer: Option<&UserRecord>) -> Result<Vec<PostView>, PostError> {
        let rows = self.posts.list_top_liked(FEATURED_LIMIT).await?;
        self.assemble(rows, viewer).await
    }

    pub async fn trending(&self, viewer: Option<&UserRecord>) -> Result<Vec<PostView>, PostError> {
        let rows = self.posts.list_top_liked(FEED_LIMIT).await?;
        self.assemble(rows, viewer).await
    }

    pub async fn following(&self, viewer: &UserRecord) -> Result<Vec<PostView>, PostError> {
        let rows = self.posts.list_following(viewer.id, FEED_LIMIT).await?;
        self.assemble(rows, Some(viewer)).await
    }

    /// Fetch a post for display, recording the view beforehand so the
    /// returned counter already includes it.
    pub async fn show(
        &self,
        id: Uuid,
        viewer: Option<&UserRecord>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<PostView, PostError> {
        if self.posts.find_by_id(id).await?.is_none() {
            return Err(PostError::NotFound);
        }

        self.posts
            .record_view(NewPostView {
                post_id: id,
                user_id: viewer.map(|user| user.id),
                ip_address,
                user_agent,
            })
            .await?;

        let row = self
            .posts
            .find_with_author(id)
            .await?
            .ok_or(PostError::NotFound)?;
        let mut views = self.assemble(vec![row], viewer).await?;
        Ok(views.remove(0))
    }

    pub async fn create(
        &self,
        author: &UserRecord,
        command: CreatePostCommand,
    ) -> Result<PostView, PostError> {
        let title = command.title.trim().to_string();
        validate_title(&title)?;
        validate_content(&command.content)?;

        let tags = match command.tags.as_deref() {
            Some(raw) => normalize_tags(raw)?,
            None => Vec::new(),
        };

        let post = self
            .posts
            .create_post(CreatePostParams {
                user_id: author.id,
                title,
                excerpt: derive_excerpt(&command.content),
                content: command.content,
                tags: tags.clone(),
            })
            .await?;

        Ok(PostView {
            post,
            author: author.clone(),
            tags,
            liked_by_current_user: false,
            reposted_by_current_user: false,
        })
    }

    pub async fn update(
        &self,
        actor: &UserRecord,
        command: UpdatePostCommand,
    ) -> Result<PostView, PostError> {
        let existing = self.owned_post(actor, command.id).await?;

        let title = command.title.trim().to_string();
        validate_title(&title)?;
        validate_content(&command.content)?;

        let post = self
            .posts
            .update_post(UpdatePostParams {
                id: existing.id,
                title,
                excerpt: derive_excerpt(&command.content),
                content: command.content,
                tags: None,
            })
            .await?;

        let tags = self.tags.names_for_post(post.id).await?;
        Ok(PostView {
            post,
            author: actor.clone(),
            tags,
            liked_by_current_user: false,
            reposted_by_current_user: false,
        })
    }

    pub async fn delete(&self, actor: &UserRecord, id: Uuid) -> Result<(), PostError> {
        let existing = self.owned_post(actor, id).await?;
        self.posts.delete_post(existing.id).await?;
        Ok(())
    }

    /// Point the post at a freshly stored narration. Returns the record and
    /// the previously stored path so the caller can delete the old file.
    pub async fn attach_audio(
        &self,
        actor: &UserRecord,
        id: Uuid,
        audio_path: &str,
    ) -> Result<(PostRecord, Option<String>), PostError> {
        let existing = self.owned_post(actor, id).await?;
        let previous = existing.audio_path.clone();
        let post = self.posts.set_audio(existing.id, Some(audio_path)).await?;
        Ok((post, previous))
    }

    /// Assemble a post for display without recording a view.
    pub async fn fetch(
        &self,
        id: Uuid,
        viewer: Option<&UserRecord>,
    ) -> Result<PostView, PostError> {
        let row = self
            .posts
            .find_with_author(id)
            .await?
            .ok_or(PostError::NotFound)?;
        let mut views = self.assemble(vec![row], viewer).await?;
        Ok(views.remove(0))
    }

    /// Detach the narration; returns the previous stored path so the caller
    /// can delete the file.
    pub async fn detach_audio(
        &self,
        actor: &UserRecord,
        id: Uuid,
    ) -> Result<Option<String>, PostError> {
        let existing = self.owned_post(actor, id).await?;
        let previous = existing.audio_path.clone();
        self.posts.set_audio(existing.id, None).await?;
        Ok(previous)
    }

    async fn owned_post(&self, actor: &UserRecord, id: Uuid) -> Result<PostRecord, PostError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(PostError::NotFound)?;
        if post.user_id != actor.id {
            return Err(PostError::Unauthorized);
        }
        Ok(post)
    }

    pub async fn assemble(
        &self,
        rows: Vec<crate::application::repos::PostWithAuthor>,
        viewer: Option<&UserRecord>,
    ) -> Result<Vec<PostView>, PostError> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.post.id).collect();

        let mut tag_map: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (post_id, name) in self.tags.names_for_posts(&ids).await? {
            tag_map.entry(post_id).or_default().push(name);
        }

        let (liked, reposted) = match viewer {
            Some(user) => {
                let liked: HashSet<Uuid> =
                    self.posts.liked_post_ids(user.id, &ids).await?.into_iter().collect();
                let reposted: HashSet<Uuid> = self
                    .posts
                    .reposted_post_ids(user.id, &ids)
                    .await?
                    .into_iter()
                    .collect();
                (liked, reposted)
            }
            None => (HashSet::new(), HashSet::new()),
        };

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = tag_map.remove(&row.post.id).unwrap_or_default();
                PostView {
                    liked_by_current_user: liked.contains(&row.post.id),
                    reposted_by_current_user: reposted.contains(&row.post.id),
                    tags,
                    author: row.author,
                    post: row.post,
                }
            })
            .collect())
    }
}
