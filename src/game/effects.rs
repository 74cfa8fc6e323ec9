//! Cosmetic particle bursts. Particles live in grid-cell coordinates and are
//! advanced once per rendered frame; they never touch game state.

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::state::{Consumable, Position};

const BURST_COUNT: usize = 12;
const BURST_LIFE: u32 = 40;
const BURST_SPEED: f32 = 0.2;
const GRAVITY: f32 = 0.01;

const TRAIL_COUNT: usize = 8;
const TRAIL_LIFE: u32 = 10;
const TRAIL_SPEED: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Fruit,
    PowerUp,
    /// Trail left where the snake crossed a grid edge
    Wrap,
}

impl From<Consumable> for ParticleKind {
    fn from(consumable: Consumable) -> Self {
        match consumable {
            Consumable::Fruit => ParticleKind::Fruit,
            Consumable::PowerUp => ParticleKind::PowerUp,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    pub life: u32,
    pub max_life: u32,
    pub kind: ParticleKind,
    gravity: bool,
}

impl Particle {
    /// Remaining life as a fraction in 0..=1
    pub fn intensity(&self) -> f32 {
        self.life as f32 / self.max_life as f32
    }

    /// Grid cell the particle currently covers
    pub fn cell(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Burst at the cell where something was eaten
    pub fn burst(&mut self, at: Position, kind: ParticleKind) {
        self.spawn(at, kind, BURST_COUNT, BURST_SPEED, BURST_LIFE, true);
    }

    /// Short fading trail at a wrap seam
    pub fn trail(&mut self, at: Position) {
        self.spawn(
            at,
            ParticleKind::Wrap,
            TRAIL_COUNT,
            TRAIL_SPEED,
            TRAIL_LIFE,
            false,
        );
    }

    fn spawn(
        &mut self,
        at: Position,
        kind: ParticleKind,
        count: usize,
        speed: f32,
        life: u32,
        gravity: bool,
    ) {
        for _ in 0..count {
            self.particles.push(Particle {
                x: at.x as f32,
                y: at.y as f32,
                vx: self.rng.gen_range(-speed..=speed),
                vy: self.rng.gen_range(-speed..=speed),
                life,
                max_life: life,
                kind,
                gravity,
            });
        }
    }

    /// Advance every particle one frame and drop the expired ones
    pub fn update(&mut self) {
        for particle in &mut self.particles {
            particle.x += particle.vx;
            particle.y += particle.vy;
            if particle.gravity {
                particle.vy += GRAVITY;
            }
            particle.life = particle.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}
