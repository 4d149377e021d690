//! Line-oriented front end. Each screen reads its inputs, calls one
//! controller action and prints the outcome inline.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::controller::{AppController, AssignmentOptions};
use crate::dto::quiz::RetestPolicy;
use crate::errors::AppError;
use crate::models::quiz::{Difficulty, QuestionType, QuizQuestion};
use crate::state::{Page, QuizRequest};

pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

enum Flow {
    Continue,
    Quit,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, label: &str) -> Result<String> {
        print!("{label}: ");
        std::io::stdout().flush().context("Failed to flush stdout")?;
        self.lines
            .next_line()
            .await
            .context("Failed to read input")?
            .map(|line| line.trim_end().to_string())
            .context("Input closed")
    }

    async fn ask_or<T: std::str::FromStr>(&mut self, label: &str, default: T) -> Result<T> {
        loop {
            let answer = self.ask(label).await?;
            if answer.trim().is_empty() {
                return Ok(default);
            }
            match answer.trim().parse() {
                Ok(value) => return Ok(value),
                Err(_) => println!("Invalid value, try again."),
            }
        }
    }

    async fn choose(&mut self, title: &str, options: &[&str]) -> Result<usize> {
        println!("\n{title}");
        for (i, option) in options.iter().enumerate() {
            println!("  {}) {option}", i + 1);
        }
        loop {
            match self.ask("Select").await?.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => println!("Please enter a number between 1 and {}.", options.len()),
            }
        }
    }

    pub async fn run(&mut self, controller: &mut AppController) -> Result<()> {
        loop {
            let flow = match controller.session().page {
                Page::Login => self.login_page(controller).await?,
                Page::SignUp => self.signup_page(controller).await?,
                Page::Home => self.home_page(controller).await?,
            };
            if let Flow::Quit = flow {
                return Ok(());
            }
        }
    }

    async fn login_page(&mut self, controller: &mut AppController) -> Result<Flow> {
        match self.choose("Login Page", &["Log In", "Sign Up", "Quit"]).await? {
            0 => {
                let email = self.ask("Email").await?;
                let password = self.ask("Password").await?;
                match controller.login(&email, &password).await {
                    Ok(()) => println!("Login successful!"),
                    Err(e) => report(&e),
                }
            }
            1 => controller.show_page(Page::SignUp),
            _ => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn signup_page(&mut self, controller: &mut AppController) -> Result<Flow> {
        println!("\nInstructor Signup");
        let name = self.ask("Name").await?;
        let email = self.ask("Email").await?;
        let password = self.ask("Password").await?;

        match controller.signup(&name, &email, &password).await {
            Ok(()) => println!("Instructor registered successfully! Please log in."),
            Err(e) => {
                report(&e);
                controller.show_page(Page::Login);
            }
        }
        Ok(Flow::Continue)
    }

    async fn home_page(&mut self, controller: &mut AppController) -> Result<Flow> {
        let options = ["Generate Quiz", "Create Groups", "View Results", "Logout", "Quit"];
        match self.choose("Home Page", &options).await? {
            0 => self.generate_quiz(controller).await?,
            1 => self.create_group(controller).await?,
            2 => println!("Quiz results are available from the backend dashboard."),
            3 => controller.logout().await,
            _ => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn create_group(&mut self, controller: &mut AppController) -> Result<()> {
        println!("\nCreate a New Group");
        let group_name = self.ask("Group Name").await?;

        let mut emails = Vec::new();
        loop {
            let email = self.ask(&format!("Email {} (blank to finish)", emails.len() + 1)).await?;
            if email.trim().is_empty() {
                break;
            }
            emails.push(email);
        }

        match controller.create_group(&group_name, &emails).await {
            Ok(group) => println!(
                "Group '{}' created with members: {}",
                group.group_name,
                group.users.join(", ")
            ),
            Err(e) => report(&e),
        }
        Ok(())
    }

    async fn generate_quiz(&mut self, controller: &mut AppController) -> Result<()> {
        println!("\nAI-Powered Quiz Generation");
        controller.start_new_quiz();

        if let Err(e) = controller.refresh_groups().await {
            report(&e);
            return Ok(());
        }
        let groups = controller.session().groups.clone();
        if groups.is_empty() {
            println!("You have no groups yet. Create one first.");
            return Ok(());
        }
        let labels: Vec<&str> = groups.iter().map(String::as_str).collect();
        let group = self.choose("Select Group", &labels).await?;
        if let Err(e) = controller.select_group(&groups[group]) {
            report(&e);
            return Ok(());
        }

        let path = self.ask("Path to learning material (PDF)").await?;
        let bytes = match tokio::fs::read(path.trim()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                println!("Error: could not read '{}': {e}", path.trim());
                return Ok(());
            }
        };
        let filename = std::path::Path::new(path.trim())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        match controller.upload_pdf(&filename, bytes).await {
            Ok(_) => println!("Learning material uploaded successfully."),
            Err(e) => {
                report(&e);
                return Ok(());
            }
        }

        let search = self.ask("Enter a query to fetch relevant content (optional)").await?;
        let difficulty = Difficulty::ALL[self.choose("Select quiz difficulty", &["Easy", "Medium", "Hard"]).await?];
        let question_type =
            QuestionType::ALL[self.choose("Select question type", &["MCQ", "Fill in the Blanks"]).await?];
        let num_questions = loop {
            match self.ask_or("Number of questions [1]", 1u32).await? {
                0 => println!("Please ask for at least one question."),
                n => break n,
            }
        };

        let request = QuizRequest {
            difficulty,
            question_type,
            num_questions,
            search: Some(search).filter(|s| !s.trim().is_empty()),
        };

        loop {
            println!("Generating quiz...");
            match controller.generate_quiz(request.clone()).await {
                Ok(questions) => print_questions(questions),
                Err(e) => report(&e),
            }

            match self.choose("Next step", &["Assign Quiz", "Regenerate", "Back"]).await? {
                0 => {
                    if self.assign_quiz(controller).await? {
                        return Ok(());
                    }
                }
                1 => continue,
                _ => return Ok(()),
            }
        }
    }

    /// Returns true once the quiz has been assigned.
    async fn assign_quiz(&mut self, controller: &mut AppController) -> Result<bool> {
        let quiz_name = self.ask("Quiz name").await?;
        let marks_for_each_qn = self.ask_or("Marks for each question [1]", 1u32).await?;
        let automated = self.ask("Automate retests? [y/N]").await?;

        let retest = if automated.trim().eq_ignore_ascii_case("y") {
            RetestPolicy::Automated {
                max_retests: self.ask_or("Maximum retests allowed [1]", 1u32).await?,
                min_marks: self.ask_or("Minimum marks to pass without retest [0]", 0u32).await?,
            }
        } else {
            RetestPolicy::Disabled
        };

        let options = AssignmentOptions {
            quiz_name,
            marks_for_each_qn,
            retest,
        };
        match controller.assign_quiz(options).await {
            Ok(quiz_id) => {
                println!("Quiz assigned successfully! (quiz id {quiz_id})");
                Ok(true)
            }
            Err(e) => {
                report(&e);
                Ok(false)
            }
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

fn report(err: &AppError) {
    if let AppError::Internal(e) = err {
        tracing::error!("Internal error: {e:#}");
    }
    println!("Error: {err}");
}

fn print_questions(questions: &[QuizQuestion]) {
    for (i, question) in questions.iter().enumerate() {
        println!("\n{}. {}", i + 1, question.question());
        if let QuizQuestion::MultipleChoice(q) = question {
            for (letter, option) in ('a'..).zip(&q.options) {
                println!("   {letter}) {option}");
            }
        }
        println!("   Answer: {}  [{}]", question.answer(), question.topic());
    }
}
