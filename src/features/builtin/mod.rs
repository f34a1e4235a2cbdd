//! Features shipped with the bot.

pub mod onboarding;

pub use onboarding::OnboardingFeature;
