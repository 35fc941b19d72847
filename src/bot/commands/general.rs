//! General Discord commands - ping and help.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Price King Help**\n\
        Compare shelf prices across supermarket chains.\n\n\
        **Shopping**\n\
        • `/search <keyword>` - Cheapest offers for matching products.\n\
        • `/shelf <chain> [category]` - Browse one chain's shelf.\n\
        • `/ask <message>` - Same as typing to the price assistant (`教學` for a tutorial).\n\n\
        **Staff**\n\
        • `/ask <passphrase>` - Get your staff ID and the price submission form.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

pub use inner::*;
