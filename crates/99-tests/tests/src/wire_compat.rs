#![cfg(all(test, not(target_arch = "wasm32")))]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use transport::MailboxSend;
use transport_codecs::{Command, CommandMailbox, WireFormat};
use transport_fabric::{DatagramReceiver, DatagramSender, ReceiverOptions};

const SENDABLE: [Command; 6] = [
    Command::Exit,
    Command::Play,
    Command::Step,
    Command::Time,
    Command::Tick,
    Command::Calibration,
];

fn listening() -> (DatagramReceiver, Arc<CommandMailbox>, DatagramSender) {
    let mailbox = Arc::new(CommandMailbox::new());
    let receiver = DatagramReceiver::bind_with(
        "127.0.0.1",
        0,
        Arc::clone(&mailbox),
        ReceiverOptions {
            receive_timeout: Duration::from_millis(5),
        },
    )
    .expect("bind receiver");
    let addr = receiver.local_addr();
    let sender = DatagramSender::connect("127.0.0.1", addr.port()).expect("connect sender");
    (receiver, mailbox, sender)
}

fn next_command(mailbox: &CommandMailbox) -> Command {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let command = mailbox.take();
        if command.is_some() {
            return command;
        }
        assert!(Instant::now() < deadline, "no command arrived");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn byte_and_text_forms_publish_the_same_command() {
    let (receiver, mailbox, sender) = listening();
    for command in SENDABLE {
        for format in [WireFormat::Byte, WireFormat::Text] {
            sender.send(command, format).expect("send");
            assert_eq!(next_command(&mailbox), command, "{command} as {format:?}");
        }
    }
    let stats = receiver.stats();
    assert_eq!(stats.published, 12);
    assert_eq!(stats.ignored, 0);
}

#[test]
fn local_publish_and_remote_publish_share_one_slot() {
    let (receiver, mailbox, sender) = listening();
    assert_eq!(mailbox.publish(Command::Play), MailboxSend::Accepted);

    sender.send(Command::Exit, WireFormat::Text).expect("send");
    let deadline = Instant::now() + Duration::from_secs(2);
    while receiver.stats().published == 0 {
        assert!(Instant::now() < deadline, "datagram never arrived");
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(receiver.stats().coalesced, 1);
    assert_eq!(mailbox.take(), Command::Exit);
    assert!(mailbox.is_empty());
    receiver.close();
}
