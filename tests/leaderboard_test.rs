mod common;

use std::time::Duration;

use common::*;
use futures_util::StreamExt;
use nird::{
    config::LeaderboardConfig,
    domain::{LeaderboardFilters, NotificationType, UserLeaderboardFilters, UserRole},
    error::AppError,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[tokio::test]
async fn test_ties_resolve_by_name_with_distinct_ranks() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;

    let (cobras, carl) = team(&ctx, "Cobras").await?;
    let (badgers, bea) = team(&ctx, "Badgers").await?;
    let (aardvarks, ada) = team(&ctx, "Aardvarks").await?;
    let (_idle, _) = team(&ctx, "Idle").await?;

    let big = mission(&ctx, "Repair", 200).await?;
    let small = mission(&ctx, "Audit", 100).await?;

    approve(&ctx, &big, &bea, &teacher).await?;
    approve(&ctx, &small, &carl, &teacher).await?;
    approve(&ctx, &small, &ada, &teacher).await?;

    let board = ctx.leaderboard_service.calculate(&LeaderboardFilters::default()).await?;
    let order: Vec<(Uuid, i64)> = board.iter().map(|e| (e.team_id, e.rank)).collect();

    // Idle has no approved work and is left off the board.
    assert_eq!(order, vec![(badgers.id, 1), (aardvarks.id, 2), (cobras.id, 3)]);

    Ok(())
}

#[tokio::test]
async fn test_filters_narrow_the_board() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;

    let north = ctx.reference_repo.create_school("Lycée Nord", Some("Lille")).await?;
    let south = ctx.reference_repo.create_school("Lycée Sud", Some("Marseille")).await?;
    let repair = ctx.reference_repo.create_category("Repair & Reuse").await?;

    let (alpha, alice) = team_in(&ctx, "Alpha", Some(north.id)).await?;
    let (beta, bob) = team_in(&ctx, "Beta", Some(south.id)).await?;

    let fix = mission_in(&ctx, "Fix a laptop", 300, Some(repair.id)).await?;
    let audit = mission(&ctx, "Audit", 100).await?;

    approve(&ctx, &fix, &alice, &teacher).await?;
    let old = approve(&ctx, &audit, &bob, &teacher).await?;
    let recent = approve(&ctx, &fix, &bob, &teacher).await?;
    assert_ne!(old.id, recent.id);

    sqlx::query("UPDATE mission_submissions SET submitted_at = datetime('now', '-10 days') WHERE id = ?")
        .bind(old.id.to_string())
        .execute(&ctx.db_pool)
        .await?;

    let by_school = ctx.leaderboard_service
        .calculate(&LeaderboardFilters { school_id: Some(north.id), ..Default::default() })
        .await?;
    assert_eq!(by_school.len(), 1);
    assert_eq!(by_school[0].team_id, alpha.id);
    assert_eq!(by_school[0].school_name.as_deref(), Some("Lycée Nord"));

    let by_category = ctx.leaderboard_service
        .calculate(&LeaderboardFilters { category_id: Some(repair.id), ..Default::default() })
        .await?;
    assert_eq!(by_category.len(), 2);
    assert!(by_category.iter().all(|e| e.total_points == 300));

    let last_week = ctx.leaderboard_service
        .calculate(&LeaderboardFilters { days: Some(7), ..Default::default() })
        .await?;
    let beta_entry = last_week.iter().find(|e| e.team_id == beta.id).unwrap();
    assert_eq!((beta_entry.total_points, beta_entry.missions_completed), (300, 1));

    let all_time = ctx.leaderboard_service.calculate(&LeaderboardFilters::default()).await?;
    assert_eq!(all_time[0].team_id, beta.id);
    assert_eq!(all_time[0].total_points, 400);
    assert_eq!(all_time[0].average_score, 200.0);

    Ok(())
}

#[tokio::test]
async fn test_cache_serves_until_points_change() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (_alpha, alice) = team(&ctx, "Alpha").await?;
    let first = mission(&ctx, "Audit", 100).await?;
    let second = mission(&ctx, "Repair", 50).await?;

    approve(&ctx, &first, &alice, &teacher).await?;

    let computed = ctx.leaderboard_service.leaderboard(&LeaderboardFilters::default()).await?;
    assert!(!computed.cached);
    let served = ctx.leaderboard_service.leaderboard(&LeaderboardFilters::default()).await?;
    assert!(served.cached);
    assert_eq!(served.last_updated, computed.last_updated);

    // Filtered boards bypass the cache.
    let filtered = ctx.leaderboard_service
        .leaderboard(&LeaderboardFilters { days: Some(30), ..Default::default() })
        .await?;
    assert!(!filtered.cached);

    approve(&ctx, &second, &alice, &teacher).await?;

    let fresh = ctx.leaderboard_service.leaderboard(&LeaderboardFilters::default()).await?;
    assert!(!fresh.cached);
    assert_eq!(fresh.entries[0].total_points, 150);

    Ok(())
}

#[tokio::test]
async fn test_history_falls_back_to_live_rank() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (alpha, alice) = team(&ctx, "Alpha").await?;
    let (idle, _) = team(&ctx, "Idle").await?;
    let m = mission(&ctx, "Audit", 100).await?;
    approve(&ctx, &m, &alice, &teacher).await?;

    let live = ctx.leaderboard_service.team_history(alpha.id, 30).await?;
    assert_eq!(live.team_name, "Alpha");
    assert_eq!(live.history.len(), 1);
    assert_eq!(live.history[0].period_type, "current");
    assert_eq!((live.history[0].rank, live.history[0].points), (1, 100));

    let empty = ctx.leaderboard_service.team_history(idle.id, 30).await?;
    assert!(empty.history.is_empty());

    let missing = ctx.leaderboard_service.team_history(Uuid::new_v4(), 30).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let recorded = ctx.leaderboard_service.capture_snapshots("daily").await?;
    assert_eq!(recorded, 1);

    let stored = ctx.leaderboard_service.team_history(alpha.id, 30).await?;
    assert_eq!(stored.history.len(), 1);
    assert_eq!(stored.history[0].period_type, "daily");

    let alpha = ctx.team_repo.find_by_id(alpha.id).await?.unwrap();
    assert_eq!(alpha.current_rank, Some(1));

    Ok(())
}

#[tokio::test]
async fn test_snapshot_notifies_on_rank_change() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (_alpha, alice) = team(&ctx, "Alpha").await?;
    let (_beta, bob) = team(&ctx, "Beta").await?;

    let audit = mission(&ctx, "Audit", 100).await?;
    let repair = mission(&ctx, "Repair", 50).await?;
    let donate = mission(&ctx, "Donate", 300).await?;

    approve(&ctx, &audit, &alice, &teacher).await?;
    approve(&ctx, &repair, &bob, &teacher).await?;
    ctx.leaderboard_service.capture_snapshots("daily").await?;

    let rank_notes = |notes: Vec<nird::domain::Notification>| {
        notes
            .into_iter()
            .filter(|n| n.notification_type == NotificationType::RankChanged)
            .collect::<Vec<_>>()
    };

    // First snapshot has nothing to compare against.
    assert!(rank_notes(ctx.notification_repo.list_for_user(alice.id, false, 50, 0).await?).is_empty());

    approve(&ctx, &donate, &bob, &teacher).await?;
    ctx.leaderboard_service.capture_snapshots("daily").await?;

    let alice_notes = rank_notes(ctx.notification_repo.list_for_user(alice.id, false, 50, 0).await?);
    assert_eq!(alice_notes.len(), 1);
    assert_eq!(alice_notes[0].title, "Your Team is Rank #2!");

    let bob_notes = rank_notes(ctx.notification_repo.list_for_user(bob.id, false, 50, 0).await?);
    assert_eq!(bob_notes.len(), 1);
    assert_eq!(bob_notes[0].title, "Your Team is Rank #1!");

    Ok(())
}

#[tokio::test]
async fn test_user_board_includes_idle_users() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (_alpha, alice) = team(&ctx, "Alpha").await?;
    let idle = user(&ctx, "idle", UserRole::Student).await?;
    let gone = user(&ctx, "gone", UserRole::Student).await?;
    ctx.user_repo.set_active(gone.id, false).await?;

    let m = mission(&ctx, "Audit", 100).await?;
    approve(&ctx, &m, &alice, &teacher).await?;

    let students = ctx.leaderboard_service
        .user_leaderboard(&UserLeaderboardFilters { role: Some(UserRole::Student), ..Default::default() })
        .await?;

    let ids: Vec<Uuid> = students.iter().map(|e| e.user_id).collect();
    assert_eq!(ids, vec![alice.id, idle.id]);
    assert_eq!(students[0].total_points, 100);
    assert_eq!(students[0].team_name.as_deref(), Some("Alpha"));
    assert!(students[0].badges_earned >= 1);
    assert_eq!((students[1].rank, students[1].total_points), (2, 0));

    let everyone = ctx.leaderboard_service.user_leaderboard(&Default::default()).await?;
    assert_eq!(everyone.len(), 3);
    assert!(everyone.iter().any(|e| e.user_id == teacher.id));

    Ok(())
}

#[tokio::test]
async fn test_stats_summarise_approved_work() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let empty = ctx.leaderboard_service.stats().await?;
    assert_eq!(empty.total_teams, 0);
    assert_eq!(empty.average_team_score, 0.0);
    assert_eq!(empty.top_team, None);

    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let school = ctx.reference_repo.create_school("Lycée Nord", None).await?;
    let (_alpha, alice) = team_in(&ctx, "Alpha", Some(school.id)).await?;
    let (_beta, bob) = team_in(&ctx, "Beta", Some(school.id)).await?;
    let (_gamma, _) = team(&ctx, "Gamma").await?;

    for (title, points) in [("Audit", 100), ("Repair", 200)] {
        let m = mission(&ctx, title, points).await?;
        approve(&ctx, &m, &alice, &teacher).await?;
    }
    let m = mission(&ctx, "Donate", 50).await?;
    approve(&ctx, &m, &bob, &teacher).await?;

    let stats = ctx.leaderboard_service.stats().await?;
    assert_eq!(stats.total_teams, 3);
    assert_eq!(stats.total_points_awarded, 350);
    assert_eq!(stats.total_missions_completed, 3);
    assert_eq!(stats.active_schools, 1);
    assert_eq!(stats.average_team_score, 116.67);
    assert_eq!(stats.top_team.as_deref(), Some("Alpha"));
    assert_eq!(stats.top_team_points, 300);

    Ok(())
}

#[tokio::test]
async fn test_stream_pushes_after_points_change() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;

    let service = ctx.leaderboard_service.clone();
    let broadcaster = service.broadcaster();
    let shutdown = CancellationToken::new();
    let worker = tokio::spawn(broadcaster.clone().run(service.clone(), shutdown.clone()));

    let mut updates = Box::pin(broadcaster.subscribe().into_stream());
    assert_eq!(broadcaster.listener_count(), 1);

    approve(&ctx, &m, &alice, &teacher).await?;

    // Skip any push computed before the approval landed.
    let update = loop {
        let update = tokio::time::timeout(Duration::from_secs(5), updates.next())
            .await?
            .expect("stream open");
        if update.total_teams > 0 {
            break update;
        }
    };
    assert_eq!(update.entries[0].team_id, alpha.id);
    assert_eq!(update.entries[0].total_points, 100);

    drop(updates);
    assert_eq!(broadcaster.listener_count(), 0);

    shutdown.cancel();
    worker.await?;

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_day_window_is_rejected() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;
    approve(&ctx, &m, &alice, &teacher).await?;

    let filters = LeaderboardFilters { days: Some(100_000_000), ..Default::default() };
    let board = ctx.leaderboard_service.leaderboard(&filters).await;
    assert!(matches!(board, Err(AppError::BadRequest(_))));

    let history = ctx.leaderboard_service.team_history(alpha.id, i64::MAX).await;
    assert!(matches!(history, Err(AppError::BadRequest(_))));

    // A wide but representable window still counts everything.
    let filters = LeaderboardFilters { days: Some(3650), ..Default::default() };
    let board = ctx.leaderboard_service.leaderboard(&filters).await?;
    assert_eq!(board.entries[0].total_points, 100);

    Ok(())
}

#[tokio::test]
async fn test_zero_stream_interval_still_streams() -> anyhow::Result<()> {
    let config = LeaderboardConfig { stream_interval_seconds: 0, ..LeaderboardConfig::default() };
    let ctx = setup_with(&config).await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (_alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;
    approve(&ctx, &m, &alice, &teacher).await?;

    let service = ctx.leaderboard_service.clone();
    let broadcaster = service.broadcaster();
    let shutdown = CancellationToken::new();
    let mut updates = Box::pin(broadcaster.subscribe().into_stream());
    let worker = tokio::spawn(broadcaster.clone().run(service.clone(), shutdown.clone()));

    let update = tokio::time::timeout(Duration::from_secs(5), updates.next())
        .await?
        .expect("stream open");
    assert_eq!(update.entries[0].total_points, 100);
    assert!(!worker.is_finished());

    shutdown.cancel();
    worker.await?;

    Ok(())
}
