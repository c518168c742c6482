use clap::Parser;
use fake::{
    faker::{
        address::en::CityName,
        lorem::en::Sentence,
        name::en::{FirstName, LastName},
    },
    Fake,
};
use nird::{
    config::LeaderboardConfig,
    domain::{
        CreateMissionRequest, CreateSubmissionRequest, CreateTeamRequest, CreateUserRequest,
        MissionDifficulty, ReviewDecision, UserRole,
    },
    service::ServiceContext,
};
use sqlx::sqlite::SqlitePoolOptions;

#[derive(Parser, Debug)]
#[command(about = "Populate a NIRD database with demo schools, teams and reviewed missions")]
struct Args {
    /// Database to seed
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://nird.db?mode=rwc")]
    database_url: String,

    /// Number of teams to create
    #[arg(long, default_value_t = 4)]
    teams: usize,

    /// Students per team, captain included
    #[arg(long, default_value_t = 3)]
    students_per_team: usize,

    /// Password given to every seeded account
    #[arg(long, default_value = "password123")]
    password: String,
}

const MISSIONS: &[(&str, i64, MissionDifficulty, usize)] = &[
    ("Audit the computer lab", 100, MissionDifficulty::Easy, 0),
    ("Install Linux on an old laptop", 200, MissionDifficulty::Medium, 1),
    ("Organise a repair café", 300, MissionDifficulty::Hard, 1),
    ("Replace a proprietary tool with free software", 150, MissionDifficulty::Medium, 2),
    ("Measure the school's printing footprint", 50, MissionDifficulty::Easy, 0),
    ("Refurbish five machines for donation", 500, MissionDifficulty::Expert, 1),
];

const CATEGORIES: &[&str] = &["Digital Sobriety", "Repair & Reuse", "Free Software"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!("🌱 Seeding {}", args.database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let ctx = ServiceContext::new(db_pool, &LeaderboardConfig::default()).await;

    // Reference data
    let mut schools = Vec::new();
    for i in 0..2 {
        let city: String = CityName().fake();
        let school = ctx.reference_repo
            .create_school(&format!("Lycée {} {}", city, i + 1), Some(&city))
            .await?;
        schools.push(school);
    }

    let mut categories = Vec::new();
    for name in CATEGORIES {
        categories.push(ctx.reference_repo.create_category(name).await?);
    }
    println!("  ✅ {} schools, {} categories", schools.len(), categories.len());

    let mut missions = Vec::new();
    for (title, points, difficulty, category) in MISSIONS {
        let mission = ctx.mission_repo
            .create(CreateMissionRequest {
                title: title.to_string(),
                description: Sentence(8..16).fake(),
                difficulty: *difficulty,
                points: *points,
                category_id: categories.get(*category).map(|c| c.id),
                requires_photo: false,
                requires_description: true,
                requires_file: false,
            })
            .await?;
        missions.push(mission);
    }
    println!("  ✅ {} missions", missions.len());

    // Staff
    ctx.user_repo
        .create(CreateUserRequest {
            email: "admin@nird.local".to_string(),
            username: "admin".to_string(),
            full_name: Some("Platform Admin".to_string()),
            password: args.password.clone(),
            role: UserRole::Admin,
            school_id: None,
        })
        .await?;

    let teacher = ctx.user_repo
        .create(CreateUserRequest {
            email: "teacher@nird.local".to_string(),
            username: "teacher".to_string(),
            full_name: Some(format!("{} {}", FirstName().fake::<String>(), LastName().fake::<String>())),
            password: args.password.clone(),
            role: UserRole::Teacher,
            school_id: schools.first().map(|s| s.id),
        })
        .await?;
    println!("  ✅ Staff accounts (admin@nird.local, teacher@nird.local / {})", args.password);

    // Teams and their students
    let mut submitted = 0;
    let mut approved = 0;

    for t in 0..args.teams {
        let school = &schools[t % schools.len()];
        let mut students = Vec::new();

        for s in 0..args.students_per_team.max(1) {
            let first: String = FirstName().fake();
            let last: String = LastName().fake();
            let username = format!("{}{}{}", first.to_lowercase(), t, s);

            let student = ctx.user_repo
                .create(CreateUserRequest {
                    email: format!("{}@students.nird.local", username),
                    username,
                    full_name: Some(format!("{} {}", first, last)),
                    password: args.password.clone(),
                    role: UserRole::Student,
                    school_id: Some(school.id),
                })
                .await?;
            students.push(student);
        }

        let captain = &students[0];
        let (team, _) = ctx.team_service
            .create_team(
                captain.id,
                CreateTeamRequest {
                    name: format!("Team {}", LastName().fake::<String>()),
                    description: Some(Sentence(4..8).fake()),
                    school_id: Some(school.id),
                },
            )
            .await?;

        for student in students.iter().skip(1) {
            ctx.team_service.add_member(captain.id, team.id, student.id).await?;
        }

        // Later teams complete fewer missions, so the board has a spread.
        let attempted = MISSIONS.len().saturating_sub(t).max(1);
        for (i, mission) in missions.iter().take(attempted).enumerate() {
            let author = &students[i % students.len()];
            let submission = ctx.review_service
                .submit(
                    mission.id,
                    author.id,
                    CreateSubmissionRequest {
                        description: Some(Sentence(6..12).fake()),
                        ..Default::default()
                    },
                )
                .await?;
            submitted += 1;

            // Every third submission is left pending, every fourth rejected.
            if i % 3 == 2 {
                continue;
            }
            let decision = if i % 4 == 3 { ReviewDecision::Rejected } else { ReviewDecision::Approved };
            if decision == ReviewDecision::Approved {
                approved += 1;
            }
            ctx.review_service
                .review(submission.id, teacher.id, decision, Some("Seeded review".to_string()))
                .await?;
        }

        println!("  ✅ {} with {} students", team.name, students.len());
    }

    let snapshots = ctx.leaderboard_service.capture_snapshots("daily").await?;

    println!("📊 {} submissions ({} approved), {} snapshots", submitted, approved, snapshots);
    println!("🎉 Seeding complete");

    Ok(())
}
