//! Card types and their effects

use serde::{Deserialize, Serialize};

use super::combat::{Bomb, Bullet, Projectiles};
use super::constants::{HEAL_AMOUNT, PLAYER_MAX_HEALTH, SPEED_BUFF_SECONDS};
use super::geometry::{sign_or, Vec2};
use super::player::Player;

/// Single-use card granted by a pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Dash = 0,
    Speed = 1,
    Shoot = 2,
    Bomb = 3,
    Heal = 4,
}

impl CardType {
    pub const ALL: [CardType; 5] = [
        CardType::Dash,
        CardType::Speed,
        CardType::Shoot,
        CardType::Bomb,
        CardType::Heal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Dash => "dash",
            CardType::Speed => "speed",
            CardType::Shoot => "shoot",
            CardType::Bomb => "bomb",
            CardType::Heal => "heal",
        }
    }

    /// Lenient parse used for settings payloads
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|card| card.as_str() == wanted)
    }

    /// Run this card's effect for `player` aiming along `aim` (unit vector or zero)
    pub fn apply(self, player: &mut Player, aim: Vec2, projectiles: &mut Projectiles) {
        let effect = CARD_EFFECTS[self as usize];
        effect(CardUse {
            player,
            aim,
            projectiles,
        });
    }
}

/// Everything a card effect may touch
pub struct CardUse<'a> {
    pub player: &'a mut Player,
    pub aim: Vec2,
    pub projectiles: &'a mut Projectiles,
}

type CardEffect = fn(CardUse<'_>);

/// Indexed by `CardType` discriminant
const CARD_EFFECTS: [CardEffect; 5] = [dash, speed, shoot, bomb, heal];

fn dash(ctx: CardUse<'_>) {
    let player = ctx.player;
    let dir = if ctx.aim.x != 0.0 {
        sign_or(ctx.aim.x, 1.0)
    } else {
        sign_or(player.facing, 1.0)
    };
    player.start_slide(dir);
}

fn speed(ctx: CardUse<'_>) {
    ctx.player.timers.speed_buff = SPEED_BUFF_SECONDS;
}

fn shoot(ctx: CardUse<'_>) {
    let bullet = Bullet::fire(ctx.player.id, ctx.player.position, ctx.aim);
    ctx.projectiles.bullets.push(bullet);
}

fn bomb(ctx: CardUse<'_>) {
    let bomb = Bomb::lob(ctx.player.id, ctx.player.position, ctx.aim);
    ctx.projectiles.bombs.push(bomb);
}

fn heal(ctx: CardUse<'_>) {
    ctx.player.health = (ctx.player.health + HEAL_AMOUNT).min(PLAYER_MAX_HEALTH);
}
