use rand::{rngs::StdRng, Rng, SeedableRng};
use uuid::Uuid;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// 전투 ID로부터 세션 시드를 만든다.
///
/// 같은 battle_id는 항상 같은 시드를 만들기 때문에, 입력 순서만 같다면 전투를 재현할 수 있다.
pub fn seed_for_battle(battle_id: Uuid) -> u64 {
    let (hi, lo) = battle_id.as_u64_pair();
    splitmix64(hi ^ lo.rotate_left(29))
}

/// 세션 전용 난수원.
///
/// 프로세스 전역 난수(`rand::thread_rng`)는 코어에서 사용하지 않는다.
#[derive(Debug, Clone)]
pub struct BattleRng {
    seed: u64,
    inner: StdRng,
}

impl BattleRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(splitmix64(seed)),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `chance`% 확률로 true. 0은 항상 false, 100 이상은 항상 true.
    pub fn roll_percent(&mut self, chance: u8) -> bool {
        match chance {
            0 => false,
            100..=u8::MAX => true,
            _ => self.inner.gen_range(0..100u8) < chance,
        }
    }

    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.pick_index(items.len()).map(|index| &items[index])
    }
}
