// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt mail` - Agent mailboxes over the town store

use clap::{Args, Subcommand};
use gt_core::AgentAddress;
use gt_dispatch::mail::inject_block;
use gt_dispatch::SendMail;

use crate::commands::address_or_own;
use crate::exit_error::ExitError;
use crate::output::{format_time_ago, OutputFormat};
use crate::GtDispatcher;

#[derive(Args)]
pub struct MailArgs {
    #[command(subcommand)]
    pub command: MailCommand,
}

#[derive(Subcommand)]
pub enum MailCommand {
    /// Send a message
    Send {
        /// Recipient address
        to: String,
        #[arg(short, long)]
        subject: String,
        #[arg(short, long, default_value = "")]
        body: String,
        /// 0 is most urgent
        #[arg(short, long, default_value_t = 2)]
        priority: u8,
    },
    /// Unread count; exits 1 silently when there is none
    Check {
        /// Mailbox to check; defaults to your own
        #[arg(long)]
        address: Option<String>,
        /// Emit a <system-reminder> block for tool-post hooks
        #[arg(long)]
        inject: bool,
    },
    /// List unread messages
    Inbox {
        #[arg(long)]
        address: Option<String>,
        /// Include read messages
        #[arg(long)]
        all: bool,
    },
    /// List every message, read or not
    List {
        #[arg(long)]
        address: Option<String>,
    },
    /// Read one message (marks it read)
    Read {
        /// Mail bead id
        id: String,
    },
}

pub async fn handle(
    args: MailArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    match args.command {
        MailCommand::Send { to, subject, body, priority } => {
            let id = dispatcher
                .send_mail(&SendMail { to, subject, body, priority })
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({"id": id})),
                OutputFormat::Text => println!("sent {id}"),
            }
        }
        MailCommand::Check { address, inject } => {
            let addr = address_or_own(dispatcher, address.as_deref())?;
            let summary = dispatcher
                .check_mail(&addr)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            if summary.unread == 0 {
                return Err(ExitError::silent(1));
            }
            if inject {
                println!("{}", inject_block(&summary));
            } else {
                match format {
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::to_string(&summary)
                            .map_err(|e| ExitError::new(1, e.to_string()))?
                    ),
                    OutputFormat::Text => {
                        println!("{} unread message(s) for {}", summary.unread, summary.address);
                    }
                }
            }
        }
        MailCommand::Inbox { address, all } => {
            let addr = address_or_own(dispatcher, address.as_deref())?;
            print_inbox(dispatcher, &addr, !all, format).await?;
        }
        MailCommand::List { address } => {
            let addr = address_or_own(dispatcher, address.as_deref())?;
            print_inbox(dispatcher, &addr, false, format).await?;
        }
        MailCommand::Read { id } => {
            let message = dispatcher
                .read_mail(&id)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&message)
                        .map_err(|e| ExitError::new(1, e.to_string()))?
                ),
                OutputFormat::Text => {
                    let from = message.slot(gt_beads::slots::MAIL_FROM).unwrap_or("?");
                    println!("From: {from}");
                    println!("Subject: {}", message.title);
                    println!();
                    println!("{}", message.description);
                }
            }
        }
    }
    Ok(())
}

async fn print_inbox(
    dispatcher: &GtDispatcher,
    addr: &AgentAddress,
    unread_only: bool,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let mail = dispatcher
        .inbox(addr, unread_only)
        .await
        .map_err(|e| ExitError::from_dispatch(e, format))?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&mail).map_err(|e| ExitError::new(1, e.to_string()))?
        ),
        OutputFormat::Text => {
            if mail.is_empty() {
                println!("inbox empty");
                return Ok(());
            }
            for message in &mail {
                let from = message.slot(gt_beads::slots::MAIL_FROM).unwrap_or("?");
                println!(
                    "{}  {:<7} {:<20} {}",
                    message.id,
                    format_time_ago(message.created_at),
                    from,
                    message.title
                );
            }
        }
    }
    Ok(())
}
