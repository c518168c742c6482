use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::authorize,
    domain::{Capability, CreateTeamRequest, Team, TeamMember, User, UserRole},
    error::{AppError, Result},
    notifications::{NotificationDispatcher, NotificationEvent},
    repository::{TeamRepository, UserRepository},
};

pub struct TeamService {
    user_repo: Arc<dyn UserRepository>,
    team_repo: Arc<dyn TeamRepository>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl TeamService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        team_repo: Arc<dyn TeamRepository>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            user_repo,
            team_repo,
            dispatcher,
        }
    }

    async fn user(&self, id: Uuid) -> Result<User> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn team(&self, id: Uuid) -> Result<Team> {
        self.team_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))
    }

    /// Admins may manage any team; everyone else must captain it.
    async fn require_captain_or_admin(&self, actor: &User, team_id: Uuid) -> Result<()> {
        authorize(actor, Capability::ManageTeams)?;
        if actor.role == UserRole::Admin {
            return Ok(());
        }

        match self.team_repo.find_membership(actor.id).await? {
            Some(m) if m.team_id == team_id && m.is_captain => Ok(()),
            _ => Err(AppError::Forbidden("Only a team captain can do this".to_string())),
        }
    }

    /// Create a team captained by its creator.
    pub async fn create_team(&self, creator_id: Uuid, request: CreateTeamRequest) -> Result<(Team, TeamMember)> {
        let creator = self.user(creator_id).await?;
        authorize(&creator, Capability::ManageTeams)?;

        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Team name is required".to_string()));
        }

        let (team, captain) = self.team_repo.create_with_captain(request, creator_id).await?;

        tracing::info!("Team {} created by {}", team.name, creator.username);
        Ok((team, captain))
    }

    pub async fn add_member(&self, actor_id: Uuid, team_id: Uuid, user_id: Uuid) -> Result<TeamMember> {
        let actor = self.user(actor_id).await?;
        let team = self.team(team_id).await?;
        self.require_captain_or_admin(&actor, team_id).await?;
        self.user(user_id).await?;

        let member = self.team_repo.add_member(team_id, user_id, false).await?;

        self.dispatcher
            .dispatch(NotificationEvent::TeamInvite {
                user_id,
                team_id,
                team_name: team.name,
            })
            .await;

        Ok(member)
    }

    /// Admins, captains of the team, and the member themself may remove a
    /// member. The last captain cannot be removed.
    pub async fn remove_member(&self, actor_id: Uuid, team_id: Uuid, user_id: Uuid) -> Result<()> {
        let actor = self.user(actor_id).await?;
        self.team(team_id).await?;

        if actor_id != user_id {
            self.require_captain_or_admin(&actor, team_id).await?;
        }

        self.team_repo.remove_member(team_id, user_id).await?;
        tracing::info!("User {} left team {}", user_id, team_id);
        Ok(())
    }

    pub async fn set_captain(
        &self,
        actor_id: Uuid,
        team_id: Uuid,
        user_id: Uuid,
        is_captain: bool,
    ) -> Result<TeamMember> {
        let actor = self.user(actor_id).await?;
        self.team(team_id).await?;
        self.require_captain_or_admin(&actor, team_id).await?;

        self.team_repo.set_captain(team_id, user_id, is_captain).await
    }

    pub async fn members(&self, team_id: Uuid) -> Result<Vec<TeamMember>> {
        self.team(team_id).await?;
        self.team_repo.list_members(team_id).await
    }
}
